//! # Sign-In-With-Ethereum Engine (MK-01)
//!
//! Builds the canonical sign-in message, parses it back, and verifies a
//! wallet's signature over it.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): message format, field validation and
//!   signature recovery; no I/O
//! - **Ports Layer** (`ports/`): [`SiweApi`] plus the [`Clock`] and
//!   [`OwnershipResolver`] dependencies
//! - **Adapters** (`adapters/`): system/fixed clocks, direct ownership
//! - **Service Layer** (`service.rs`): wires domain logic to ports
//!
//! ## Security Notes
//!
//! - Signatures are EIP-191 `personal_sign` over the exact message text
//! - High-S signatures are rejected (EIP-2)
//! - Every structural or cryptographic failure during `verify` surfaces as
//!   [`SiweError::SignatureVerificationFailed`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::clock::{FixedClock, SystemClock};
pub use adapters::ownership::DirectOwnership;
pub use domain::ecdsa::{address_from_pubkey, address_to_hex, keccak256, personal_message_hash};
pub use domain::entities::{
    Address, AddressMismatchPolicy, PageContext, SignedSiweMessage, SiweMessageData,
    SiweVerification, SiweVerifyOptions, ADDRESS_PLACEHOLDER,
};
pub use domain::errors::{SignatureError, SiweError};
pub use domain::message::{generate, parse};
pub use domain::validation::{is_hex_address, validate_nonce};
pub use ports::inbound::SiweApi;
pub use ports::outbound::{Clock, OwnershipError, OwnershipResolver};
pub use service::SiweService;
