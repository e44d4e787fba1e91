//! # Inbound Ports (Driving Ports / API)

use crate::domain::errors::BridgeError;
use serde_json::Value;
use shared_types::{
    CommandRequest, PayInput, PayOutput, SendTransactionInput, SendTransactionOutput, SignMessageInput,
    SignTypedDataInput, SignatureOutput, VerifyInput, VerifyOutput, WalletAuthInput,
    WalletAuthOutput,
};
use std::time::Duration;

/// Command bridge API.
///
/// Every call resolves with a typed payload or a [`BridgeError`].
#[async_trait::async_trait]
pub trait BridgeApi: Send + Sync {
    /// Whether a native host was detected at install time.
    fn is_installed(&self) -> bool;

    /// Run any command. `timeout` applies to the native path only and
    /// defaults to the configured budget.
    async fn run(
        &self,
        request: CommandRequest,
        timeout: Option<Duration>,
    ) -> Result<Value, BridgeError>;

    async fn wallet_auth(&self, input: WalletAuthInput) -> Result<WalletAuthOutput, BridgeError>;

    async fn sign_message(&self, input: SignMessageInput) -> Result<SignatureOutput, BridgeError>;

    async fn sign_typed_data(
        &self,
        input: SignTypedDataInput,
    ) -> Result<SignatureOutput, BridgeError>;

    async fn send_transaction(
        &self,
        input: SendTransactionInput,
    ) -> Result<SendTransactionOutput, BridgeError>;

    async fn verify(&self, input: VerifyInput) -> Result<VerifyOutput, BridgeError>;

    async fn pay(&self, input: PayInput) -> Result<PayOutput, BridgeError>;
}
