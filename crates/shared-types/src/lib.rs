//! # Shared Types Crate
//!
//! This crate contains the message shapes exchanged between a mini-app and
//! the native host it is embedded in.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Envelope, response and capability types are
//!   defined here and nowhere else.
//! - **Closed Command Set**: Every command the bridge can run is a variant of
//!   [`Command`]; payloads are typed per variant in [`CommandRequest`].
//! - **Correlation by Id Only**: Responses are matched to requests solely by
//!   [`RequestId`], never by arrival order.

pub mod capabilities;
pub mod commands;
pub mod envelope;
pub mod errors;

pub use capabilities::{DeviceOs, HostCapabilities, SupportedCommand};
pub use commands::*;
pub use envelope::{CommandEnvelope, RequestId, ResponseEvent, ResponseStatus};
pub use errors::WireError;

/// Response event pushed by the host when the user revokes a permission.
///
/// Unsolicited: it carries no request id.
pub const PERMISSION_REVOKED_EVENT: &str = "miniapp-permission-revoked";
