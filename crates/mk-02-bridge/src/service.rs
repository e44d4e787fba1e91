//! # Bridge Service
//!
//! [`MiniKitBridge`] owns every piece of per-session state: the capability
//! snapshot, the fallback slot, the pending request table and the bus
//! subscriptions the correlation engine holds. Nothing is global, so two
//! bridges never see each other's requests.
//!
//! ## Request lifecycle (native path)
//!
//! ```text
//! Created ──register──→ Sent ──response──→ Resolved | Rejected
//!                         └────budget elapsed──→ TimedOut
//! ```
//!
//! The pending entry is registered and the response listener installed
//! before the envelope is posted, so even a synchronous host cannot answer
//! ahead of the table.

use crate::adapters::registry::FallbackRegistry;
use crate::domain::config::BridgeConfig;
use crate::domain::errors::BridgeError;
use crate::domain::negotiation::{resolve_transport, Route};
use crate::domain::pending::{PendingRequestStore, PendingStats};
use crate::domain::validation::validate_request;
use crate::ports::inbound::BridgeApi;
use crate::ports::outbound::{FallbackAdapter, HostDescriptorSource, Transport};
use chrono::SecondsFormat;
use mk_01_siwe::{
    Clock, PageContext, SiweApi, SiweMessageData, SiweService, SystemClock, ADDRESS_PLACEHOLDER,
};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use shared_bus::{ListenerError, Subscription, SubscriptionBus};
use shared_types::{
    Command, CommandEnvelope, CommandRequest, HostCapabilities, PayInput, PayOutput, RequestId,
    ResponseEvent, ResponseStatus, SendTransactionInput, SendTransactionOutput, SignMessageInput,
    SignTypedDataInput, SignatureOutput, VerifyInput, VerifyOutput, WalletAuthInput,
    WalletAuthOutput,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Chain id the native host signs sign-in messages for.
pub const WORLD_CHAIN_ID: u64 = 480;

type IdSource = Arc<dyn Fn() -> RequestId + Send + Sync>;

/// Command bridge for one mini-app session.
pub struct MiniKitBridge {
    config: BridgeConfig,
    transport: Arc<dyn Transport>,
    descriptor_source: Arc<dyn HostDescriptorSource>,
    bus: Arc<SubscriptionBus>,
    capabilities: RwLock<Option<Arc<HostCapabilities>>>,
    fallback: FallbackRegistry,
    pending: Arc<PendingRequestStore>,
    subscriptions: Mutex<HashMap<Command, Subscription>>,
    id_source: IdSource,
    clock: Arc<dyn Clock>,
    page: Option<PageContext>,
    wallet_address: RwLock<Option<String>>,
}

impl MiniKitBridge {
    /// Validate `config` and take the capability snapshot.
    ///
    /// A missing descriptor means no native host; a malformed one is logged
    /// and treated the same way.
    pub fn install(
        config: BridgeConfig,
        transport: Arc<dyn Transport>,
        descriptor_source: Arc<dyn HostDescriptorSource>,
        bus: Arc<SubscriptionBus>,
    ) -> Result<Self, BridgeError> {
        config.validate()?;

        let page = config
            .page_url
            .as_deref()
            .and_then(|url| PageContext::parse(url).ok());
        let capabilities = read_capabilities(descriptor_source.as_ref());

        info!(
            app_id = ?config.app_id,
            native_host = capabilities.is_some(),
            native_transport = transport.is_available(),
            "MiniKit bridge installed"
        );

        Ok(Self {
            config,
            transport,
            descriptor_source,
            bus,
            capabilities: RwLock::new(capabilities),
            fallback: FallbackRegistry::new(),
            pending: Arc::new(PendingRequestStore::new()),
            subscriptions: Mutex::new(HashMap::new()),
            id_source: Arc::new(RequestId::generate),
            clock: Arc::new(SystemClock),
            page,
            wallet_address: RwLock::new(None),
        })
    }

    /// Replace the request id generator.
    pub fn with_request_id_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> RequestId + Send + Sync + 'static,
    {
        self.id_source = Arc::new(source);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Re-read the host descriptor. Returns whether a native host is present.
    pub fn reinstall(&self) -> bool {
        let capabilities = read_capabilities(self.descriptor_source.as_ref());
        let installed = capabilities.is_some();
        *self.capabilities.write() = capabilities;
        info!(native_host = installed, "Host capabilities re-read");
        installed
    }

    pub fn capabilities(&self) -> Option<Arc<HostCapabilities>> {
        self.capabilities.read().clone()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn fallback(&self) -> &FallbackRegistry {
        &self.fallback
    }

    pub fn set_fallback_adapter(&self, adapter: Arc<dyn FallbackAdapter>) {
        self.fallback.set_adapter(adapter);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    pub fn stats(&self) -> &PendingStats {
        self.pending.stats()
    }

    /// Address recorded by the last successful `wallet-auth`.
    pub fn wallet_address(&self) -> Option<String> {
        self.wallet_address.read().clone()
    }

    /// Pick the route for `command` at its current version.
    pub fn negotiate(&self, command: Command) -> Result<Route, BridgeError> {
        self.negotiate_with(command, self.fallback.get_adapter().as_ref())
    }

    fn negotiate_with(
        &self,
        command: Command,
        adapter: Option<&Arc<dyn FallbackAdapter>>,
    ) -> Result<Route, BridgeError> {
        let fallback_supports = adapter.is_some_and(|adapter| adapter.supports(command));
        resolve_transport(
            command,
            command.version(),
            self.capabilities().as_deref(),
            self.transport.is_available(),
            fallback_supports,
        )
    }

    async fn dispatch(
        &self,
        request: CommandRequest,
        timeout: Option<Duration>,
    ) -> Result<Value, BridgeError> {
        let command = request.command();
        if self.config.strict_requests {
            validate_request(&request, self.clock.now())?;
        }

        // Negotiation and the fallback call share one snapshot of the slot.
        let adapter = self.fallback.get_adapter();
        match (self.negotiate_with(command, adapter.as_ref())?, adapter) {
            (Route::Native, _) => {
                let payload = self.native_payload(&request)?;
                self.run_native(command, payload, timeout.unwrap_or(self.config.default_timeout()))
                    .await
            }
            (Route::Fallback, Some(adapter)) => self.run_fallback(adapter, request).await,
            (Route::Fallback, None) => Err(BridgeError::FallbackNotConfigured(command)),
        }
    }

    fn native_payload(&self, request: &CommandRequest) -> Result<Value, BridgeError> {
        match request {
            CommandRequest::WalletAuth(input) => {
                let message = self.native_siwe_message(input)?;
                Ok(json!({ "siweMessage": message }))
            }
            other => other
                .payload()
                .map_err(|e| BridgeError::MalformedRequest(e.to_string())),
        }
    }

    /// Sign-in message with the address left for the host to fill in.
    fn native_siwe_message(&self, input: &WalletAuthInput) -> Result<String, BridgeError> {
        let page = self.page.as_ref().ok_or_else(|| {
            BridgeError::MalformedRequest("wallet-auth requires a configured page_url".into())
        })?;
        let timestamp = |t: chrono::DateTime<chrono::Utc>| t.to_rfc3339_opts(SecondsFormat::Millis, true);

        let data = SiweMessageData {
            scheme: Some(page.scheme().to_string()),
            domain: page.host(),
            address: ADDRESS_PLACEHOLDER.to_string(),
            statement: input.statement.clone(),
            uri: page.href().to_string(),
            version: 1,
            chain_id: WORLD_CHAIN_ID,
            nonce: input.nonce.clone(),
            issued_at: timestamp(self.clock.now()),
            expiration_time: input.expiration_time.map(timestamp),
            not_before: input.not_before.map(timestamp),
            request_id: input.request_id.clone(),
        };

        let siwe = SiweService::new(page.clone()).with_clock(self.clock.clone());
        Ok(siwe.generate(&data)?)
    }

    async fn run_native(
        &self,
        command: Command,
        payload: Value,
        budget: Duration,
    ) -> Result<Value, BridgeError> {
        let request_id = (self.id_source)();
        let mut rx = self.pending.register(request_id.clone(), command)?;
        let _guard = PendingGuard {
            store: &self.pending,
            request_id: &request_id,
        };
        self.ensure_subscribed(command);

        let envelope = CommandEnvelope::new(command, request_id.clone(), payload);
        self.transport.send(&envelope);
        debug!(
            request_id = %request_id,
            command = %command,
            timeout_ms = budget.as_millis() as u64,
            "Command sent to native host"
        );

        match tokio::time::timeout(budget, &mut rx).await {
            Ok(Ok(settlement)) => settlement,
            Ok(Err(_)) => Err(BridgeError::GenericError {
                code: None,
                message: format!("response channel for request {request_id} closed"),
            }),
            Err(_) => {
                if self.pending.expire(&request_id) {
                    warn!(
                        request_id = %request_id,
                        command = %command,
                        timeout_ms = budget.as_millis() as u64,
                        "Command timed out"
                    );
                    return Err(BridgeError::Timeout {
                        command,
                        request_id: request_id.clone(),
                        timeout_ms: budget.as_millis() as u64,
                    });
                }
                // Settled in the same instant the budget ran out.
                rx.try_recv().unwrap_or_else(|_| {
                    Err(BridgeError::GenericError {
                        code: None,
                        message: format!("response for request {request_id} lost"),
                    })
                })
            }
        }
    }

    /// Install the response listener for `command` unless a live one exists.
    ///
    /// Application code may clear the response event name on the shared bus,
    /// which silently drops our listener along with its own.
    fn ensure_subscribed(&self, command: Command) {
        let mut subscriptions = self.subscriptions.lock();
        match subscriptions.get(&command) {
            Some(subscription) if subscription.is_active() => return,
            Some(_) => warn!(
                command = %command,
                event = command.response_event(),
                "Response listener was removed from the bus, reinstalling"
            ),
            None => {}
        }

        let pending = Arc::downgrade(&self.pending);
        let subscription = self
            .bus
            .subscribe(command.response_event(), move |raw: &Value| {
                let event = ResponseEvent::from_value(raw)
                    .map_err(|e| ListenerError::UnexpectedPayload(e.to_string()))?;
                let Some(request_id) = event.request_id else {
                    debug!(event = %event.event, "Uncorrelated host event ignored");
                    return Ok(());
                };
                let Some(pending) = pending.upgrade() else {
                    return Ok(());
                };

                let settlement = match event.status {
                    ResponseStatus::Success => Ok(event.payload),
                    ResponseStatus::Error => Err(BridgeError::from_host_error(&event.payload)),
                };
                pending.complete(&request_id, settlement);
                Ok(())
            });
        debug!(command = %command, event = command.response_event(), "Response listener installed");
        subscriptions.insert(command, subscription);
    }

    async fn run_fallback(
        &self,
        adapter: Arc<dyn FallbackAdapter>,
        request: CommandRequest,
    ) -> Result<Value, BridgeError> {
        let command = request.command();
        debug!(command = %command, adapter = adapter.name(), "Running command on fallback adapter");

        match request {
            CommandRequest::WalletAuth(input) => to_payload(adapter.wallet_auth(input).await?),
            CommandRequest::SignMessage(input) => to_payload(adapter.sign_message(input).await?),
            CommandRequest::SignTypedData(input) => {
                to_payload(adapter.sign_typed_data(input).await?)
            }
            CommandRequest::SendTransaction(input) => {
                to_payload(adapter.send_transaction(input).await?)
            }
            CommandRequest::Verify(input) => to_payload(adapter.verify(input).await?),
            CommandRequest::Pay(_)
            | CommandRequest::ShareContacts(_)
            | CommandRequest::RequestPermission(_)
            | CommandRequest::GetPermissions
            | CommandRequest::SendHapticFeedback(_)
            | CommandRequest::Share(_)
            | CommandRequest::Chat(_) => Err(BridgeError::UnsupportedCommand {
                command,
                version: command.version(),
            }),
        }
    }

    fn record_wallet_address(&self, payload: &Value) {
        if let Some(address) = payload.get("address").and_then(Value::as_str) {
            info!(address = address, "Wallet authenticated");
            *self.wallet_address.write() = Some(address.to_string());
        }
    }
}

#[async_trait::async_trait]
impl BridgeApi for MiniKitBridge {
    fn is_installed(&self) -> bool {
        self.capabilities.read().is_some()
    }

    async fn run(
        &self,
        request: CommandRequest,
        timeout: Option<Duration>,
    ) -> Result<Value, BridgeError> {
        let command = request.command();
        let result = self.dispatch(request, timeout).await;
        match &result {
            Ok(payload) if command == Command::WalletAuth => self.record_wallet_address(payload),
            Ok(_) => {}
            Err(e) => debug!(command = %command, kind = e.kind(), error = %e, "Command failed"),
        }
        result
    }

    async fn wallet_auth(&self, input: WalletAuthInput) -> Result<WalletAuthOutput, BridgeError> {
        let payload = self.run(CommandRequest::WalletAuth(input), None).await?;
        from_payload(Command::WalletAuth, payload)
    }

    async fn sign_message(&self, input: SignMessageInput) -> Result<SignatureOutput, BridgeError> {
        let payload = self.run(CommandRequest::SignMessage(input), None).await?;
        from_payload(Command::SignMessage, payload)
    }

    async fn sign_typed_data(
        &self,
        input: SignTypedDataInput,
    ) -> Result<SignatureOutput, BridgeError> {
        let payload = self.run(CommandRequest::SignTypedData(input), None).await?;
        from_payload(Command::SignTypedData, payload)
    }

    async fn send_transaction(
        &self,
        input: SendTransactionInput,
    ) -> Result<SendTransactionOutput, BridgeError> {
        let payload = self.run(CommandRequest::SendTransaction(input), None).await?;
        from_payload(Command::SendTransaction, payload)
    }

    async fn verify(&self, input: VerifyInput) -> Result<VerifyOutput, BridgeError> {
        let payload = self.run(CommandRequest::Verify(input), None).await?;
        from_payload(Command::Verify, payload)
    }

    async fn pay(&self, input: PayInput) -> Result<PayOutput, BridgeError> {
        let payload = self.run(CommandRequest::Pay(input), None).await?;
        from_payload(Command::Pay, payload)
    }
}

/// Drops the pending entry if the caller goes away before settlement.
struct PendingGuard<'a> {
    store: &'a PendingRequestStore,
    request_id: &'a RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.store.cancel(self.request_id) {
            debug!(request_id = %self.request_id, "Pending request abandoned by caller");
        }
    }
}

fn read_capabilities(source: &dyn HostDescriptorSource) -> Option<Arc<HostCapabilities>> {
    let descriptor = source.descriptor()?;
    match HostCapabilities::from_descriptor(&descriptor) {
        Ok(Some(capabilities)) => {
            info!(
                host_version = capabilities.version,
                os = ?capabilities.os,
                commands = capabilities.supported_commands().len(),
                "Host capability snapshot taken"
            );
            Some(Arc::new(capabilities))
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed host descriptor");
            None
        }
    }
}

fn to_payload<T: Serialize>(output: T) -> Result<Value, BridgeError> {
    serde_json::to_value(output).map_err(|e| BridgeError::GenericError {
        code: None,
        message: e.to_string(),
    })
}

fn from_payload<T: DeserializeOwned>(command: Command, payload: Value) -> Result<T, BridgeError> {
    serde_json::from_value(payload).map_err(|e| BridgeError::GenericError {
        code: None,
        message: format!("unexpected '{command}' response: {e}"),
    })
}
