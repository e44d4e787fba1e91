//! # Bridge Errors
//!
//! Every public call resolves with a typed payload or one of these.

use mk_01_siwe::SiweError;
use serde_json::Value;
use shared_types::{Command, RequestId};
use thiserror::Error;

use super::config::ConfigError;

/// Host `error_code` values with a dedicated variant.
pub mod host_codes {
    pub const USER_REJECTED: &str = "user_rejected";
    pub const VERIFICATION_REJECTED: &str = "verification_rejected";
    pub const MALFORMED_REQUEST: &str = "malformed_request";
    pub const GENERIC_ERROR: &str = "generic_error";
}

/// Bridge error taxonomy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The host supports the command but no native channel is reachable,
    /// and no fallback adapter covers it.
    #[error("No transport available for '{0}'")]
    TransportUnavailable(Command),

    /// Negotiation found neither a native nor a fallback path.
    #[error("Command '{command}' version {version} is not supported")]
    UnsupportedCommand { command: Command, version: u32 },

    /// No matching response arrived within the budget.
    #[error("Command '{command}' timed out after {timeout_ms}ms (request {request_id})")]
    Timeout {
        command: Command,
        request_id: RequestId,
        timeout_ms: u64,
    },

    /// The host or wallet reported that the user cancelled.
    #[error("User rejected the request: {0}")]
    UserRejected(String),

    /// The request could not be built or sent as given.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Input failed local validation before anything was sent.
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// The fallback path was chosen but no usable adapter is configured.
    #[error("No fallback adapter configured for '{0}'")]
    FallbackNotConfigured(Command),

    /// Uncategorized host-reported failure.
    #[error("Host error{}: {message}", .code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    GenericError {
        code: Option<String>,
        message: String,
    },

    /// Failure reported by a fallback adapter or its backing library.
    #[error("Adapter '{adapter}' failed: {message}")]
    Adapter { adapter: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl BridgeError {
    /// Build the error for a host response with `status: "error"`.
    pub fn from_host_error(payload: &Value) -> Self {
        let code = payload
            .get("error_code")
            .and_then(Value::as_str)
            .map(str::to_string);
        let message = payload
            .get("details")
            .or_else(|| payload.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| code.clone())
            .unwrap_or_else(|| host_codes::GENERIC_ERROR.to_string());

        match code.as_deref() {
            Some(host_codes::USER_REJECTED) | Some(host_codes::VERIFICATION_REJECTED) => {
                BridgeError::UserRejected(message)
            }
            Some(host_codes::MALFORMED_REQUEST) => BridgeError::MalformedRequest(message),
            _ => BridgeError::GenericError { code, message },
        }
    }

    /// Short machine-readable name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::TransportUnavailable(_) => "transport_unavailable",
            BridgeError::UnsupportedCommand { .. } => "unsupported_command",
            BridgeError::Timeout { .. } => "timeout",
            BridgeError::UserRejected(_) => "user_rejected",
            BridgeError::MalformedRequest(_) => "malformed_request",
            BridgeError::ValidationError(_) => "validation_error",
            BridgeError::SignatureVerificationFailed => "signature_verification_failed",
            BridgeError::FallbackNotConfigured(_) => "fallback_not_configured",
            BridgeError::GenericError { .. } => "generic_error",
            BridgeError::Adapter { .. } => "adapter",
            BridgeError::Config(_) => "config",
        }
    }
}

impl From<SiweError> for BridgeError {
    fn from(e: SiweError) -> Self {
        match e {
            SiweError::SignatureVerificationFailed => BridgeError::SignatureVerificationFailed,
            other => BridgeError::ValidationError(other.to_string()),
        }
    }
}
