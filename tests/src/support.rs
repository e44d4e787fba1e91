//! # Test Support
//!
//! A scripted native host that answers envelopes through the bus, an
//! in-memory wallet library for the wagmi-style adapter, and a proof service
//! for the attestation adapter.

use k256::ecdsa::SigningKey;
use mk_01_siwe::{address_from_pubkey, address_to_hex, keccak256, personal_message_hash};
use mk_02_bridge::{
    BridgeConfig, Connector, HostEventPump, MemoryChannel, MiniKitBridge, ProofError,
    ProofProvider, StaticDescriptor, WalletBackend, WalletConnection, WalletError,
    WebviewTransport,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_bus::SubscriptionBus;
use shared_types::{
    Command, CommandEnvelope, DeviceOs, ResponseEvent, SignTypedDataInput, TransactionCall,
    VerifyInput, VerifyOutput,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const PAGE_URL: &str = "https://mini.example.org/app";

/// `personal_sign` with `v` in {27, 28}.
pub fn personal_sign(key: &SigningKey, message: &str) -> String {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&personal_message_hash(message))
        .expect("signing failed");
    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte() + 27);
    format!("0x{}", hex::encode(bytes))
}

pub fn address_of(key: &SigningKey) -> String {
    address_to_hex(&address_from_pubkey(key.verifying_key()))
}

/// Host descriptor advertising each `(name, version)` pair.
pub fn descriptor(commands: &[(&str, u32)]) -> Value {
    let supported: Vec<Value> = commands
        .iter()
        .map(|(name, version)| json!({ "name": name, "supported_versions": [version] }))
        .collect();
    json!({
        "world_app_version": 2_715,
        "device_os": "ios",
        "supported_commands": supported,
    })
}

pub fn config() -> BridgeConfig {
    BridgeConfig {
        app_id: Some("app_staging_test".into()),
        page_url: Some(PAGE_URL.into()),
        ..Default::default()
    }
}

// =============================================================================
// SIMULATED NATIVE HOST
// =============================================================================

/// Native host that answers posted envelopes.
///
/// Envelopes are answered in batches of `batch`, each batch in reverse
/// arrival order. Commands listed in `rejecting` get a `user_rejected` error.
pub struct SimulatedHost {
    key: SigningKey,
    batch: usize,
    rejecting: Vec<Command>,
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self {
            key: SigningKey::from_slice(&[0x5A; 32]).expect("valid scalar"),
            batch: 1,
            rejecting: Vec::new(),
        }
    }

    pub fn answering_in_reverse_batches(mut self, batch: usize) -> Self {
        self.batch = batch.max(1);
        self
    }

    pub fn rejecting(mut self, command: Command) -> Self {
        self.rejecting.push(command);
        self
    }

    pub fn address(&self) -> String {
        address_of(&self.key)
    }

    pub fn respond(&self, envelope: &CommandEnvelope) -> ResponseEvent {
        let command = envelope.command;
        let id = envelope.request_id.clone();
        if self.rejecting.contains(&command) {
            return ResponseEvent::error(
                command,
                id,
                json!({ "status": "error", "error_code": "user_rejected" }),
            );
        }

        let address = self.address();
        let payload = match command {
            Command::WalletAuth => {
                let template = envelope.payload["siweMessage"].as_str().unwrap_or_default();
                let message = template.replace(mk_01_siwe::ADDRESS_PLACEHOLDER, &address);
                json!({
                    "status": "success",
                    "version": 2,
                    "address": address,
                    "signature": personal_sign(&self.key, &message),
                    "message": message,
                })
            }
            Command::SignMessage => {
                let message = envelope.payload["message"].as_str().unwrap_or_default();
                json!({
                    "status": "success",
                    "version": 1,
                    "address": address,
                    "signature": personal_sign(&self.key, message),
                })
            }
            Command::SendTransaction | Command::Pay => json!({
                "status": "success",
                "transaction_id": format!("tx-{id}"),
                "reference": envelope.payload.get("reference"),
            }),
            _ => json!({ "status": "success" }),
        };
        ResponseEvent::success(command, id, payload)
    }

    /// Read envelopes from `inbound` and write JSON responses to `outbound`.
    pub fn spawn(
        self,
        mut inbound: mpsc::UnboundedReceiver<String>,
        outbound: mpsc::UnboundedSender<String>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Some(raw) = inbound.recv().await {
                let Ok(envelope) = serde_json::from_str::<CommandEnvelope>(&raw) else {
                    continue;
                };
                held.push(envelope);
                if held.len() < self.batch {
                    continue;
                }
                for envelope in held.drain(..).rev() {
                    let response = self.respond(&envelope);
                    let text = serde_json::to_string(&response).expect("serializable");
                    if outbound.send(text).is_err() {
                        return;
                    }
                }
            }
        })
    }
}

/// A bridge wired to a [`SimulatedHost`] through the event pump.
pub struct NativeSession {
    pub bridge: Arc<MiniKitBridge>,
    pub bus: Arc<SubscriptionBus>,
    /// Raw host-to-page channel, for injecting unsolicited pushes.
    pub to_page: mpsc::UnboundedSender<String>,
    pub host_address: String,
}

/// Must run inside a Tokio runtime.
pub fn start_native_session(host: SimulatedHost, descriptor: Value) -> NativeSession {
    let (channel, posted) = MemoryChannel::forwarding();
    let (to_page, from_host) = mpsc::unbounded_channel();
    let bus = Arc::new(SubscriptionBus::new());

    let transport = WebviewTransport::new()
        .with_ios(Arc::new(channel))
        .for_os(DeviceOs::Ios);
    let bridge = MiniKitBridge::install(
        config(),
        Arc::new(transport),
        Arc::new(StaticDescriptor::new(Some(descriptor))),
        bus.clone(),
    )
    .expect("valid config");

    let host_address = host.address();
    host.spawn(posted, to_page.clone());
    tokio::spawn(HostEventPump::new(bus.clone()).run(from_host));

    NativeSession {
        bridge: Arc::new(bridge),
        bus,
        to_page,
        host_address,
    }
}

// =============================================================================
// IN-MEMORY WALLET LIBRARY
// =============================================================================

pub struct InMemoryWallet {
    key: SigningKey,
    connectors: Vec<Connector>,
    current: Mutex<Option<WalletConnection>>,
    nonce: Mutex<u64>,
    pub receipts_awaited: Mutex<Vec<String>>,
}

impl InMemoryWallet {
    pub fn new(key: SigningKey, connectors: &[&str]) -> Self {
        Self {
            key,
            connectors: connectors
                .iter()
                .map(|id| Connector {
                    id: id.to_string(),
                    name: id.to_string(),
                })
                .collect(),
            current: Mutex::new(None),
            nonce: Mutex::new(0),
            receipts_awaited: Mutex::new(Vec::new()),
        }
    }

    pub fn random(connectors: &[&str]) -> Self {
        Self::new(SigningKey::random(&mut rand::thread_rng()), connectors)
    }

    pub fn address(&self) -> String {
        address_of(&self.key)
    }
}

#[async_trait::async_trait]
impl WalletBackend for InMemoryWallet {
    async fn current_connection(&self) -> Option<WalletConnection> {
        self.current.lock().clone()
    }

    fn connectors(&self) -> Vec<Connector> {
        self.connectors.clone()
    }

    async fn connect(&self, connector: &Connector) -> Result<WalletConnection, WalletError> {
        if !self.connectors.contains(connector) {
            return Err(WalletError::ConnectorNotFound(connector.id.clone()));
        }
        let connection = WalletConnection {
            connector_id: connector.id.clone(),
            accounts: vec![self.address()],
            chain_id: 480,
        };
        *self.current.lock() = Some(connection.clone());
        Ok(connection)
    }

    async fn sign_message(&self, _account: &str, message: &str) -> Result<String, WalletError> {
        Ok(personal_sign(&self.key, message))
    }

    async fn sign_typed_data(
        &self,
        _account: &str,
        input: &SignTypedDataInput,
    ) -> Result<String, WalletError> {
        let encoded = serde_json::to_vec(&input.message)
            .map_err(|e| WalletError::Failed(e.to_string()))?;
        Ok(format!("0x{}", hex::encode(keccak256(&encoded))))
    }

    async fn send_transaction(
        &self,
        account: &str,
        call: &TransactionCall,
        chain_id: u64,
    ) -> Result<String, WalletError> {
        let mut nonce = self.nonce.lock();
        *nonce += 1;
        let preimage = format!("{account}:{}:{chain_id}:{}", call.address, *nonce);
        Ok(format!("0x{}", hex::encode(keccak256(preimage.as_bytes()))))
    }

    async fn wait_for_receipt(&self, hash: &str) -> Result<(), WalletError> {
        self.receipts_awaited.lock().push(hash.to_string());
        Ok(())
    }
}

// =============================================================================
// PROOF SERVICE
// =============================================================================

/// Attestation service that proves any non-blocked action.
pub struct InMemoryProofs {
    pub blocked_actions: Vec<String>,
}

#[async_trait::async_trait]
impl ProofProvider for InMemoryProofs {
    async fn request_proof(&self, input: &VerifyInput) -> Result<VerifyOutput, ProofError> {
        if self.blocked_actions.contains(&input.action) {
            return Err(ProofError::Rejected);
        }
        let nullifier = keccak256(
            format!("{}:{}", input.action, input.signal.as_deref().unwrap_or_default()).as_bytes(),
        );
        Ok(VerifyOutput {
            proof: "0x00".into(),
            merkle_root: "0x01".into(),
            nullifier_hash: format!("0x{}", hex::encode(nullifier)),
            verification_level: input.verification_level,
        })
    }
}
