//! # Command Envelope
//!
//! The outbound wrapper for every command sent to the native host, and the
//! inbound response event the host pushes back.
//!
//! ## Correlation
//!
//! - Every outbound [`CommandEnvelope`] carries a freshly generated `requestId`.
//! - The host echoes that `requestId` on the matching [`ResponseEvent`].
//! - Unsolicited host pushes (e.g. a revoked permission) carry no `requestId`.

use crate::commands::Command;
use crate::errors::WireError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Opaque per-call token used to match a response to its request.
///
/// Generated from a random UUID, but treated as an opaque string on the wire
/// so that whatever the host echoes back can be compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random request id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The message posted to the native host for every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    /// Which command the host should run.
    pub command: Command,
    /// Command version the payload is shaped for.
    pub version: u32,
    /// Correlation token echoed back on the response.
    pub request_id: RequestId,
    /// Command-specific payload.
    pub payload: Value,
}

impl CommandEnvelope {
    /// Build an envelope for `command` at its current version.
    pub fn new(command: Command, request_id: RequestId, payload: Value) -> Self {
        Self {
            command,
            version: command.version(),
            request_id,
            payload,
        }
    }

    /// Serialize to the JSON text posted over the native channel.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Outcome reported by the host on a response event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

impl ResponseStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseStatus::Success => "success",
            ResponseStatus::Error => "error",
        }
    }
}

/// A response or notification delivered by the host through the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEvent {
    /// Event name the message is published under.
    pub event: String,
    /// Correlation token, absent for unsolicited notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    /// Success or error.
    pub status: ResponseStatus,
    /// Result payload, or error details when `status` is `error`.
    #[serde(default)]
    pub payload: Value,
}

impl ResponseEvent {
    /// Successful response to a correlated command.
    pub fn success(command: Command, request_id: RequestId, payload: Value) -> Self {
        Self {
            event: command.response_event().to_string(),
            request_id: Some(request_id),
            status: ResponseStatus::Success,
            payload,
        }
    }

    /// Failed response to a correlated command.
    pub fn error(command: Command, request_id: RequestId, payload: Value) -> Self {
        Self {
            event: command.response_event().to_string(),
            request_id: Some(request_id),
            status: ResponseStatus::Error,
            payload,
        }
    }

    /// Notification pushed by the host without a triggering request.
    pub fn unsolicited(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            request_id: None,
            status: ResponseStatus::Success,
            payload,
        }
    }

    /// Parse an inbound host message.
    pub fn from_json(raw: &str) -> Result<Self, WireError> {
        serde_json::from_str(raw).map_err(|e| WireError::Malformed(e.to_string()))
    }

    /// Decode from an already-parsed JSON value (as published on the bus).
    pub fn from_value(value: &Value) -> Result<Self, WireError> {
        Self::deserialize(value).map_err(|e| WireError::Malformed(e.to_string()))
    }

    /// The JSON value published on the bus. Same shape as the wire form.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("event".into(), Value::String(self.event.clone()));
        if let Some(request_id) = &self.request_id {
            object.insert("requestId".into(), Value::String(request_id.to_string()));
        }
        object.insert("status".into(), Value::String(self.status.as_str().into()));
        object.insert("payload".into(), self.payload.clone());
        Value::Object(object)
    }

    /// The host's `error_code`, if the payload carries one.
    pub fn error_code(&self) -> Option<&str> {
        self.payload.get("error_code").and_then(Value::as_str)
    }
}
