//! # SIWE Errors
//!
//! Error types for message generation, parsing and verification.

use thiserror::Error;

/// Errors raised by the SIWE message engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SiweError {
    /// A field failed local validation before a message was generated.
    #[error("{0}")]
    Validation(String),

    /// A required labelled line is absent from the message.
    #[error("Missing '{0}'")]
    MissingField(&'static str),

    /// A labelled line is present but its value cannot be decoded.
    #[error("Invalid value for '{label}': {value}")]
    InvalidField { label: &'static str, value: String },

    /// A labelled line appears more than once.
    #[error("Duplicate '{0}'")]
    DuplicateField(&'static str),

    /// A non-empty line matches no known label.
    #[error("Unexpected line in message: {0}")]
    UnexpectedLine(String),

    /// A timestamp is not valid RFC 3339.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Nonce mismatch. Got: {got}, Expected: {expected}")]
    NonceMismatch { got: String, expected: String },

    #[error("Statement mismatch. Got: {got}, Expected: {expected}")]
    StatementMismatch { got: String, expected: String },

    #[error("Request ID mismatch. Got: {got}, Expected: {expected}")]
    RequestIdMismatch { got: String, expected: String },

    #[error("Expired message")]
    Expired,

    #[error("Not Before time has not passed")]
    NotYetValid,

    /// Cryptographic recovery failed or the signer does not match.
    #[error("Signature verification failed")]
    SignatureVerificationFailed,
}

/// Low-level signature decoding and recovery errors.
///
/// Always surfaced to callers as [`SiweError::SignatureVerificationFailed`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature format is invalid (wrong length, invalid encoding)
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Signature has high S value (EIP-2 malleability protection)
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature
    #[error("Failed to recover public key")]
    RecoveryFailed,
}

impl From<SignatureError> for SiweError {
    fn from(_: SignatureError) -> Self {
        SiweError::SignatureVerificationFailed
    }
}
