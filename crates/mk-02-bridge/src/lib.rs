//! # MiniKit Command Bridge (MK-02)
//!
//! Lets a mini-app run host-native commands (wallet signing, payments,
//! permissions) and still work as a plain web page when no host is present.
//!
//! ## Architecture
//!
//! ```text
//!                ┌────────────────────┐
//!  mini-app ───→ │    MiniKitBridge   │ ── negotiate ──┬──→ Transport ──→ native host
//!                │ (correlation eng.) │                │                      │
//!                └─────────▲──────────┘                └──→ FallbackAdapter    │ events
//!                          │ requestId match                 (wagmi, attest.)  ▼
//!                          └──────────── Subscription Bus ←── HostEventPump ←──┘
//! ```
//!
//! - **Domain Layer** (`domain/`): error taxonomy, config, negotiation rule,
//!   pending-request table, input checks
//! - **Ports Layer** (`ports/`): [`BridgeApi`] plus transport, descriptor,
//!   fallback, wallet and proof dependencies
//! - **Adapters** (`adapters/`): webview transport, event pump, fallback
//!   registry, wagmi-style and attestation adapters
//! - **Service Layer** (`service.rs`): [`MiniKitBridge`]
//!
//! ## Guarantees
//!
//! - A pending request settles exactly once; late and duplicate responses
//!   are dropped.
//! - Concurrent commands of the same kind are told apart only by request id
//!   and settle in whatever order their responses arrive.
//! - Native is preferred whenever the host advertises the command at the
//!   current version and a channel is reachable.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::attestation::AttestationAdapter;
pub use adapters::descriptor::StaticDescriptor;
pub use adapters::event_pump::HostEventPump;
pub use adapters::registry::FallbackRegistry;
pub use adapters::transport::{MemoryChannel, NoopTransport, WebviewTransport};
pub use adapters::wagmi::{WagmiAdapter, NATIVE_CONNECTOR_ID};
pub use domain::config::{BridgeConfig, ConfigError, DEFAULT_TIMEOUT_MS};
pub use domain::errors::{host_codes, BridgeError};
pub use domain::negotiation::{resolve_transport, Route};
pub use domain::pending::{PendingRequestStore, PendingStats, Settlement};
pub use ports::inbound::BridgeApi;
pub use ports::outbound::{
    ChannelError, Connector, FallbackAdapter, HostDescriptorSource, NativeChannel, ProofError,
    ProofProvider, Transport, WalletBackend, WalletConnection, WalletError,
};
pub use service::{MiniKitBridge, WORLD_CHAIN_ID};
