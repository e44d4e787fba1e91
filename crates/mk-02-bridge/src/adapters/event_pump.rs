//! Inbound host messages onto the Subscription Bus.

use shared_bus::EventPublisher;
use shared_types::{ResponseEvent, WireError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Parses raw host messages as [`ResponseEvent`]s and republishes them on
/// the bus under the event's name.
#[derive(Clone)]
pub struct HostEventPump {
    bus: Arc<dyn EventPublisher>,
}

impl HostEventPump {
    pub fn new(bus: Arc<dyn EventPublisher>) -> Self {
        Self { bus }
    }

    /// Deliver one raw message. Returns the number of listeners reached.
    pub fn deliver(&self, raw: &str) -> Result<usize, WireError> {
        let event = ResponseEvent::from_json(raw)?;
        Ok(self.publish(&event))
    }

    /// Publish an already-decoded event.
    pub fn publish(&self, event: &ResponseEvent) -> usize {
        let delivered = self.bus.publish(&event.event, &event.to_value());
        debug!(
            event = %event.event,
            request_id = ?event.request_id.as_ref().map(|id| id.as_str()),
            delivered,
            "Host event published"
        );
        delivered
    }

    /// Drain `inbound` until the host side closes it. Malformed messages are
    /// logged and skipped.
    pub async fn run(self, mut inbound: mpsc::UnboundedReceiver<String>) {
        while let Some(raw) = inbound.recv().await {
            if let Err(e) = self.deliver(&raw) {
                warn!(error = %e, "Dropping malformed host message");
            }
        }
        debug!("Host event channel closed, stopping pump");
    }
}
