//! # Outbound Ports (Driven Ports / SPI)
//!
//! Traits for everything the bridge talks to.

use crate::domain::errors::BridgeError;
use serde_json::Value;
use shared_types::{
    Command, CommandEnvelope, SendTransactionInput, SendTransactionOutput, SignMessageInput,
    SignTypedDataInput, SignatureOutput, TransactionCall, VerifyInput, VerifyOutput,
    WalletAuthInput, WalletAuthOutput,
};
use thiserror::Error;

// =============================================================================
// NATIVE TRANSPORT
// =============================================================================

/// Error from posting to a platform message handler.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The handler is gone (webview torn down)
    #[error("Channel closed")]
    Closed,

    #[error("Post failed: {0}")]
    PostFailed(String),
}

/// One platform postable handler (`webkit.messageHandlers.minikit` on iOS,
/// the injected `Android` object on Android).
pub trait NativeChannel: Send + Sync {
    fn post(&self, message: &str) -> Result<(), ChannelError>;
}

/// One-way transport to the native host.
///
/// `send` never fails for a missing channel; callers check
/// [`Transport::is_available`] first. Responses arrive on the bus.
pub trait Transport: Send + Sync {
    fn is_available(&self) -> bool;

    fn send(&self, envelope: &CommandEnvelope);
}

/// Source of the host capability descriptor injected into the page.
pub trait HostDescriptorSource: Send + Sync {
    /// The descriptor, or `None` when no native host is present.
    fn descriptor(&self) -> Option<Value>;
}

// =============================================================================
// FALLBACK ADAPTERS
// =============================================================================

/// Alternate implementation of capabilities used when the host lacks them.
///
/// Every operation defaults to `UnsupportedCommand`; adapters override what
/// they implement and report it through [`FallbackAdapter::supports`].
#[async_trait::async_trait]
pub trait FallbackAdapter: Send + Sync {
    /// Name used in logs and adapter errors.
    fn name(&self) -> &str;

    fn supports(&self, command: Command) -> bool;

    async fn wallet_auth(&self, _input: WalletAuthInput) -> Result<WalletAuthOutput, BridgeError> {
        Err(unsupported(Command::WalletAuth))
    }

    async fn sign_message(&self, _input: SignMessageInput) -> Result<SignatureOutput, BridgeError> {
        Err(unsupported(Command::SignMessage))
    }

    async fn sign_typed_data(
        &self,
        _input: SignTypedDataInput,
    ) -> Result<SignatureOutput, BridgeError> {
        Err(unsupported(Command::SignTypedData))
    }

    async fn send_transaction(
        &self,
        _input: SendTransactionInput,
    ) -> Result<SendTransactionOutput, BridgeError> {
        Err(unsupported(Command::SendTransaction))
    }

    async fn verify(&self, _input: VerifyInput) -> Result<VerifyOutput, BridgeError> {
        Err(unsupported(Command::Verify))
    }
}

fn unsupported(command: Command) -> BridgeError {
    BridgeError::UnsupportedCommand {
        command,
        version: command.version(),
    }
}

// =============================================================================
// WALLET BACKEND (wagmi-style connection library)
// =============================================================================

/// Error from the wallet connection library.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The user dismissed the wallet prompt
    #[error("User rejected the request")]
    UserRejected,

    #[error("Connector '{0}' not found")]
    ConnectorNotFound(String),

    #[error("{0}")]
    Failed(String),
}

/// A configured wallet connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    pub id: String,
    pub name: String,
}

/// An established wallet connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    pub connector_id: String,
    pub accounts: Vec<String>,
    pub chain_id: u64,
}

impl WalletConnection {
    /// First account, the one that signs.
    pub fn primary_account(&self) -> Option<&str> {
        self.accounts.first().map(String::as_str)
    }
}

/// Wallet connection library behind the wagmi-style adapter.
#[async_trait::async_trait]
pub trait WalletBackend: Send + Sync {
    /// The connection currently held by the library, if any.
    async fn current_connection(&self) -> Option<WalletConnection>;

    /// Configured connectors, in preference order.
    fn connectors(&self) -> Vec<Connector>;

    async fn connect(&self, connector: &Connector) -> Result<WalletConnection, WalletError>;

    /// `personal_sign`; returns the 0x-hex signature.
    async fn sign_message(&self, account: &str, message: &str) -> Result<String, WalletError>;

    async fn sign_typed_data(
        &self,
        account: &str,
        input: &SignTypedDataInput,
    ) -> Result<String, WalletError>;

    /// Submit one call; returns the transaction hash.
    async fn send_transaction(
        &self,
        account: &str,
        call: &TransactionCall,
        chain_id: u64,
    ) -> Result<String, WalletError>;

    async fn wait_for_receipt(&self, hash: &str) -> Result<(), WalletError>;
}

// =============================================================================
// PROOF PROVIDER (attestation service)
// =============================================================================

/// Error from the attestation service.
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("Verification rejected")]
    Rejected,

    #[error("{0}")]
    Failed(String),
}

/// External attestation service producing proofs for `verify`.
#[async_trait::async_trait]
pub trait ProofProvider: Send + Sync {
    async fn request_proof(&self, input: &VerifyInput) -> Result<VerifyOutput, ProofError>;
}
