//! # Error Types
//!
//! Errors raised while decoding host-provided wire data.

use thiserror::Error;

/// Errors that can occur when decoding messages coming from the host.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    /// The inbound text is not valid JSON or does not match the expected shape.
    #[error("Malformed host message: {0}")]
    Malformed(String),

    /// The host referenced a command name this bridge does not know.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The host reported an operating system this bridge does not know.
    #[error("Unknown device OS: {0}")]
    UnknownOs(String),
}
