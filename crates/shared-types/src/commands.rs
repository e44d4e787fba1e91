//! # Commands
//!
//! The closed set of commands a mini-app can run on its host, with one typed
//! input per command and typed outputs for the commands a fallback adapter
//! can also serve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

// =============================================================================
// COMMAND KINDS
// =============================================================================

/// Every command the bridge knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    Verify,
    Pay,
    WalletAuth,
    SendTransaction,
    SignMessage,
    SignTypedData,
    ShareContacts,
    RequestPermission,
    GetPermissions,
    SendHapticFeedback,
    Share,
    Chat,
}

impl Command {
    /// All command kinds, in declaration order.
    pub const ALL: [Command; 12] = [
        Command::Verify,
        Command::Pay,
        Command::WalletAuth,
        Command::SendTransaction,
        Command::SignMessage,
        Command::SignTypedData,
        Command::ShareContacts,
        Command::RequestPermission,
        Command::GetPermissions,
        Command::SendHapticFeedback,
        Command::Share,
        Command::Chat,
    ];

    /// Wire name used in envelopes and in the host's capability descriptor.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Command::Verify => "verify",
            Command::Pay => "pay",
            Command::WalletAuth => "wallet-auth",
            Command::SendTransaction => "send-transaction",
            Command::SignMessage => "sign-message",
            Command::SignTypedData => "sign-typed-data",
            Command::ShareContacts => "share-contacts",
            Command::RequestPermission => "request-permission",
            Command::GetPermissions => "get-permissions",
            Command::SendHapticFeedback => "send-haptic-feedback",
            Command::Share => "share",
            Command::Chat => "chat",
        }
    }

    /// Look up a command by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Name of the bus event the host answers this command on.
    #[must_use]
    pub fn response_event(self) -> &'static str {
        match self {
            Command::Verify => "miniapp-verify-action",
            Command::Pay => "miniapp-payment",
            Command::WalletAuth => "miniapp-wallet-auth",
            Command::SendTransaction => "miniapp-send-transaction",
            Command::SignMessage => "miniapp-sign-message",
            Command::SignTypedData => "miniapp-sign-typed-data",
            Command::ShareContacts => "miniapp-share-contacts",
            Command::RequestPermission => "miniapp-request-permission",
            Command::GetPermissions => "miniapp-get-permissions",
            Command::SendHapticFeedback => "miniapp-send-haptic-feedback",
            Command::Share => "miniapp-share",
            Command::Chat => "miniapp-chat",
        }
    }

    /// Payload version this bridge emits for the command.
    #[must_use]
    pub fn version(self) -> u32 {
        match self {
            Command::WalletAuth => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// COMMAND INPUTS
// =============================================================================

/// Sign-in request. The host (or fallback wallet) signs a SIWE message built
/// from these fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WalletAuthInput {
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignMessageInput {
    pub message: String,
}

/// EIP-712 typed-data signing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignTypedDataInput {
    /// Map of type name to field list.
    pub types: Value,
    pub primary_type: String,
    pub message: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

/// One contract call inside a send-transaction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionCall {
    /// 0x-prefixed target address.
    pub address: String,
    /// 0x-prefixed calldata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Value in wei, as a decimal or 0x-hex string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTransactionInput {
    pub transactions: Vec<TransactionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    Orb,
    Device,
}

/// Proof-of-personhood attestation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyInput {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    pub verification_level: VerificationLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub symbol: String,
    pub token_amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayInput {
    pub reference: String,
    pub to: String,
    pub tokens: Vec<TokenAmount>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShareContactsInput {
    pub is_multi_select_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Notifications,
    Contacts,
    Microphone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPermissionInput {
    pub permission: Permission,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendHapticFeedbackInput {
    /// `impact`, `notification` or `selection-changed`.
    pub haptics_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShareInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInput {
    pub message: String,
    #[serde(default)]
    pub to: Vec<String>,
}

/// A command together with its typed input.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandRequest {
    Verify(VerifyInput),
    Pay(PayInput),
    WalletAuth(WalletAuthInput),
    SendTransaction(SendTransactionInput),
    SignMessage(SignMessageInput),
    SignTypedData(SignTypedDataInput),
    ShareContacts(ShareContactsInput),
    RequestPermission(RequestPermissionInput),
    GetPermissions,
    SendHapticFeedback(SendHapticFeedbackInput),
    Share(ShareInput),
    Chat(ChatInput),
}

impl CommandRequest {
    /// The command kind this request runs.
    #[must_use]
    pub fn command(&self) -> Command {
        match self {
            CommandRequest::Verify(_) => Command::Verify,
            CommandRequest::Pay(_) => Command::Pay,
            CommandRequest::WalletAuth(_) => Command::WalletAuth,
            CommandRequest::SendTransaction(_) => Command::SendTransaction,
            CommandRequest::SignMessage(_) => Command::SignMessage,
            CommandRequest::SignTypedData(_) => Command::SignTypedData,
            CommandRequest::ShareContacts(_) => Command::ShareContacts,
            CommandRequest::RequestPermission(_) => Command::RequestPermission,
            CommandRequest::GetPermissions => Command::GetPermissions,
            CommandRequest::SendHapticFeedback(_) => Command::SendHapticFeedback,
            CommandRequest::Share(_) => Command::Share,
            CommandRequest::Chat(_) => Command::Chat,
        }
    }

    /// The input serialized as a JSON payload.
    pub fn payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            CommandRequest::Verify(input) => serde_json::to_value(input),
            CommandRequest::Pay(input) => serde_json::to_value(input),
            CommandRequest::WalletAuth(input) => serde_json::to_value(input),
            CommandRequest::SendTransaction(input) => serde_json::to_value(input),
            CommandRequest::SignMessage(input) => serde_json::to_value(input),
            CommandRequest::SignTypedData(input) => serde_json::to_value(input),
            CommandRequest::ShareContacts(input) => serde_json::to_value(input),
            CommandRequest::RequestPermission(input) => serde_json::to_value(input),
            CommandRequest::GetPermissions => Ok(json!({})),
            CommandRequest::SendHapticFeedback(input) => serde_json::to_value(input),
            CommandRequest::Share(input) => serde_json::to_value(input),
            CommandRequest::Chat(input) => serde_json::to_value(input),
        }
    }
}

// =============================================================================
// COMMAND OUTPUTS
// =============================================================================

/// Signed sign-in message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAuthOutput {
    pub address: String,
    pub message: String,
    pub signature: String,
}

/// Result of message or typed-data signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureOutput {
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub signature: String,
    pub address: String,
}

/// Result of a send-transaction call.
///
/// A single call reports `transaction_hash`; a batch also lists every hash
/// in `hashes`, in execution order. Native hosts report `transaction_id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SendTransactionOutput {
    #[serde(default, alias = "transactionHash", skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// Result of a native payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayOutput {
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub transaction_id: String,
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Proof returned by an attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutput {
    pub proof: String,
    pub merkle_root: String,
    pub nullifier_hash: String,
    pub verification_level: VerificationLevel,
}

fn default_status() -> String {
    "success".to_string()
}

fn default_version() -> u32 {
    1
}
