//! Native transport adapters.

use crate::ports::outbound::{ChannelError, NativeChannel, Transport};
use parking_lot::Mutex;
use shared_types::{CommandEnvelope, DeviceOs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Transport over the webview's platform message handlers.
#[derive(Clone, Default)]
pub struct WebviewTransport {
    ios: Option<Arc<dyn NativeChannel>>,
    android: Option<Arc<dyn NativeChannel>>,
    os: Option<DeviceOs>,
}

impl WebviewTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ios(mut self, handler: Arc<dyn NativeChannel>) -> Self {
        self.ios = Some(handler);
        self
    }

    pub fn with_android(mut self, handler: Arc<dyn NativeChannel>) -> Self {
        self.android = Some(handler);
        self
    }

    /// Pin the handler to the host OS. Without it the iOS handler is
    /// preferred when both exist.
    pub fn for_os(mut self, os: DeviceOs) -> Self {
        self.os = Some(os);
        self
    }

    fn handler(&self) -> Option<&Arc<dyn NativeChannel>> {
        match self.os {
            Some(DeviceOs::Ios) => self.ios.as_ref(),
            Some(DeviceOs::Android) => self.android.as_ref(),
            None => self.ios.as_ref().or(self.android.as_ref()),
        }
    }
}

impl Transport for WebviewTransport {
    fn is_available(&self) -> bool {
        self.handler().is_some()
    }

    fn send(&self, envelope: &CommandEnvelope) {
        let Some(handler) = self.handler() else {
            warn!(
                command = %envelope.command,
                request_id = %envelope.request_id,
                "No native handler, envelope dropped"
            );
            return;
        };

        let message = match envelope.to_json() {
            Ok(message) => message,
            Err(e) => {
                error!(
                    command = %envelope.command,
                    error = %e,
                    "Failed to serialize envelope"
                );
                return;
            }
        };

        match handler.post(&message) {
            Ok(()) => debug!(
                command = %envelope.command,
                version = envelope.version,
                request_id = %envelope.request_id,
                "Envelope posted to native host"
            ),
            Err(e) => warn!(
                command = %envelope.command,
                request_id = %envelope.request_id,
                error = %e,
                "Native post failed"
            ),
        }
    }
}

/// Plain browser: no native host.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransport;

impl Transport for NoopTransport {
    fn is_available(&self) -> bool {
        false
    }

    fn send(&self, envelope: &CommandEnvelope) {
        debug!(
            command = %envelope.command,
            "No native transport, envelope dropped"
        );
    }
}

/// In-memory native handler. Records every posted message and optionally
/// forwards it to a channel, where a simulated host can answer it.
#[derive(Default)]
pub struct MemoryChannel {
    posted: Mutex<Vec<String>>,
    forward: Option<mpsc::UnboundedSender<String>>,
    closed: AtomicBool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel that also forwards posts to the returned receiver.
    pub fn forwarding() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Self {
            forward: Some(tx),
            ..Self::default()
        };
        (channel, rx)
    }

    /// Make every subsequent post fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().clone()
    }

    /// Posted messages decoded as envelopes; undecodable ones are skipped.
    pub fn envelopes(&self) -> Vec<CommandEnvelope> {
        self.posted
            .lock()
            .iter()
            .filter_map(|raw| serde_json::from_str(raw).ok())
            .collect()
    }
}

impl NativeChannel for MemoryChannel {
    fn post(&self, message: &str) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::Closed);
        }
        self.posted.lock().push(message.to_string());
        if let Some(forward) = &self.forward {
            forward
                .send(message.to_string())
                .map_err(|e| ChannelError::PostFailed(e.to_string()))?;
        }
        Ok(())
    }
}
