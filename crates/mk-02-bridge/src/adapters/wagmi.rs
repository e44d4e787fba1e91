//! Wallet-connection fallback adapter.
//!
//! Serves `wallet-auth`, `sign-message`, `sign-typed-data` and
//! `send-transaction` through a [`WalletBackend`] when the native host is
//! missing or lacks the command.
//!
//! ## Connect-or-reuse
//!
//! 1. Reuse the current connection if it has accounts and, when no native
//!    host is present, was not made through the native-only connector.
//! 2. Otherwise try each configured connector in order, skipping the
//!    native-only connector when no native host is present. The first
//!    connection with an account wins.
//! 3. If every attempt fails, the error lists each connector's failure.

use crate::domain::errors::BridgeError;
use crate::ports::outbound::{
    Connector, FallbackAdapter, WalletBackend, WalletConnection, WalletError,
};
use chrono::SecondsFormat;
use mk_01_siwe::{Clock, PageContext, SiweApi, SiweMessageData, SiweService, SystemClock};
use shared_types::{
    Command, SendTransactionInput, SendTransactionOutput, SignMessageInput, SignTypedDataInput,
    SignatureOutput, WalletAuthInput, WalletAuthOutput,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Connector id of the native host's own wallet connector.
pub const NATIVE_CONNECTOR_ID: &str = "worldApp";

const ADAPTER_NAME: &str = "wagmi";

pub struct WagmiAdapter<W: WalletBackend> {
    backend: W,
    siwe: SiweService<Arc<dyn Clock>>,
    native_host_present: bool,
}

impl<W: WalletBackend> WagmiAdapter<W> {
    /// Adapter for a page with no native host.
    pub fn new(backend: W, page: PageContext) -> Self {
        Self {
            backend,
            siwe: SiweService::new(page).with_clock(Arc::new(SystemClock) as Arc<dyn Clock>),
            native_host_present: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.siwe = self.siwe.with_clock(clock);
        self
    }

    /// Allow the native-only connector (and connections made through it).
    pub fn with_native_host(mut self, present: bool) -> Self {
        self.native_host_present = present;
        self
    }

    pub fn backend(&self) -> &W {
        &self.backend
    }

    fn usable(&self, connector_id: &str) -> bool {
        self.native_host_present || connector_id != NATIVE_CONNECTOR_ID
    }

    async fn connect(&self, command: Command) -> Result<WalletConnection, BridgeError> {
        if let Some(connection) = self.backend.current_connection().await {
            if !connection.accounts.is_empty() && self.usable(&connection.connector_id) {
                debug!(connector = %connection.connector_id, "Reusing wallet connection");
                return Ok(connection);
            }
        }

        let connectors = self.backend.connectors();
        if connectors.is_empty() {
            return Err(BridgeError::FallbackNotConfigured(command));
        }

        let mut failures = Vec::new();
        for connector in connectors.iter().filter(|c| self.usable(&c.id)) {
            match self.try_connect(connector).await {
                Ok(connection) => return Ok(connection),
                Err(reason) => {
                    warn!(connector = %connector.id, reason = %reason, "Wallet connector failed");
                    failures.push(format!("{}: {reason}", connector.id));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no connector usable without a native host".to_string());
        }
        Err(adapter_error(format!(
            "all wallet connectors failed ({})",
            failures.join("; ")
        )))
    }

    async fn try_connect(&self, connector: &Connector) -> Result<WalletConnection, String> {
        let connection = self
            .backend
            .connect(connector)
            .await
            .map_err(|e| e.to_string())?;
        if connection.accounts.is_empty() {
            return Err("connected without accounts".to_string());
        }
        info!(
            connector = %connector.id,
            account = %connection.accounts[0],
            chain_id = connection.chain_id,
            "Wallet connected"
        );
        Ok(connection)
    }

    fn primary(connection: &WalletConnection) -> Result<String, BridgeError> {
        connection
            .primary_account()
            .map(str::to_string)
            .ok_or_else(|| adapter_error("connection has no accounts".to_string()))
    }
}

fn adapter_error(message: String) -> BridgeError {
    BridgeError::Adapter {
        adapter: ADAPTER_NAME.to_string(),
        message,
    }
}

fn wallet_error(e: WalletError) -> BridgeError {
    match e {
        WalletError::UserRejected => BridgeError::UserRejected(e.to_string()),
        other => adapter_error(other.to_string()),
    }
}

#[async_trait::async_trait]
impl<W: WalletBackend> FallbackAdapter for WagmiAdapter<W> {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    fn supports(&self, command: Command) -> bool {
        matches!(
            command,
            Command::WalletAuth
                | Command::SignMessage
                | Command::SignTypedData
                | Command::SendTransaction
        )
    }

    async fn wallet_auth(&self, input: WalletAuthInput) -> Result<WalletAuthOutput, BridgeError> {
        let connection = self.connect(Command::WalletAuth).await?;
        let address = Self::primary(&connection)?;
        let page = self.siwe.page();
        let timestamp = |t: chrono::DateTime<chrono::Utc>| t.to_rfc3339_opts(SecondsFormat::Millis, true);

        let data = SiweMessageData {
            scheme: Some(page.scheme().to_string()),
            domain: page.host(),
            address: address.clone(),
            statement: input.statement,
            uri: page.href().to_string(),
            version: 1,
            chain_id: connection.chain_id,
            nonce: input.nonce,
            issued_at: timestamp(self.siwe.clock().now()),
            expiration_time: input.expiration_time.map(timestamp),
            not_before: input.not_before.map(timestamp),
            request_id: input.request_id,
        };
        let message = self.siwe.generate(&data)?;
        let signature = self
            .backend
            .sign_message(&address, &message)
            .await
            .map_err(wallet_error)?;

        Ok(WalletAuthOutput {
            address,
            message,
            signature,
        })
    }

    async fn sign_message(&self, input: SignMessageInput) -> Result<SignatureOutput, BridgeError> {
        let connection = self.connect(Command::SignMessage).await?;
        let address = Self::primary(&connection)?;
        let signature = self
            .backend
            .sign_message(&address, &input.message)
            .await
            .map_err(wallet_error)?;
        Ok(SignatureOutput {
            status: "success".to_string(),
            version: Command::SignMessage.version(),
            signature,
            address,
        })
    }

    async fn sign_typed_data(
        &self,
        input: SignTypedDataInput,
    ) -> Result<SignatureOutput, BridgeError> {
        let connection = self.connect(Command::SignTypedData).await?;
        let address = Self::primary(&connection)?;
        let signature = self
            .backend
            .sign_typed_data(&address, &input)
            .await
            .map_err(wallet_error)?;
        Ok(SignatureOutput {
            status: "success".to_string(),
            version: Command::SignTypedData.version(),
            signature,
            address,
        })
    }

    /// Calls run one after another; each waits for its receipt before the
    /// next is sent. The first failure aborts the batch.
    async fn send_transaction(
        &self,
        input: SendTransactionInput,
    ) -> Result<SendTransactionOutput, BridgeError> {
        let connection = self.connect(Command::SendTransaction).await?;
        let address = Self::primary(&connection)?;
        let chain_id = input.chain_id.unwrap_or(connection.chain_id);

        let mut hashes = Vec::with_capacity(input.transactions.len());
        for call in &input.transactions {
            let hash = self
                .backend
                .send_transaction(&address, call, chain_id)
                .await
                .map_err(wallet_error)?;
            self.backend
                .wait_for_receipt(&hash)
                .await
                .map_err(wallet_error)?;
            debug!(hash = %hash, to = %call.address, "Transaction confirmed");
            hashes.push(hash);
        }

        Ok(if hashes.len() == 1 {
            SendTransactionOutput {
                transaction_hash: hashes.pop(),
                ..Default::default()
            }
        } else {
            SendTransactionOutput {
                transaction_hash: hashes.last().cloned(),
                hashes,
                transaction_id: None,
            }
        })
    }
}
