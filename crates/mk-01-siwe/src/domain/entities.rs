//! # Domain Entities
//!
//! Core data structures for SIWE messages.

use serde::{Deserialize, Serialize};
use url::Url;

/// Address placeholder the native host substitutes with the signing wallet.
pub const ADDRESS_PLACEHOLDER: &str = "{address}";

/// Ethereum-style address derived from public key (last 20 bytes of keccak256(pubkey))
pub type Address = [u8; 20];

/// Fields of a Sign-In-With-Ethereum message.
///
/// Timestamps are kept as the exact RFC 3339 text that appears in the
/// message so that formatting and parsing agree byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiweMessageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    pub domain: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    pub uri: String,
    pub version: u32,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// The page the mini-app runs on. Binds `domain` and `uri` of generated
/// messages to where they were generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    url: Url,
}

impl PageContext {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Parse a page URL.
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Url::parse(url).map(Self::new)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host including a non-default port, as browsers report `location.host`.
    pub fn host(&self) -> String {
        host_with_port(&self.url)
    }

    /// Full page URL, as browsers report `location.href`.
    pub fn href(&self) -> &str {
        self.url.as_str()
    }
}

pub(crate) fn host_with_port(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// A signed sign-in message as returned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedSiweMessage {
    pub message: String,
    /// 0x-prefixed 65-byte signature (r || s || v).
    pub signature: String,
    /// Address the wallet claims signed the message.
    pub address: String,
}

/// Outcome of a successful verification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweVerification {
    pub is_valid: bool,
    pub siwe_message_data: SiweMessageData,
}

/// What to do when the signature recovers cleanly but the signer does not
/// control the claimed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMismatchPolicy {
    /// Fail with `SignatureVerificationFailed`.
    #[default]
    Reject,
    /// Return `is_valid: false`.
    Report,
}

/// Optional checks applied by `verify` on top of the nonce.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SiweVerifyOptions {
    pub statement: Option<String>,
    pub request_id: Option<String>,
    pub mismatch_policy: AddressMismatchPolicy,
}
