//! Host descriptor sources.

use crate::ports::outbound::HostDescriptorSource;
use parking_lot::RwLock;
use serde_json::Value;

/// Descriptor held in memory, replaceable to simulate a host update.
#[derive(Debug, Default)]
pub struct StaticDescriptor {
    descriptor: RwLock<Option<Value>>,
}

impl StaticDescriptor {
    pub fn new(descriptor: Option<Value>) -> Self {
        Self {
            descriptor: RwLock::new(descriptor),
        }
    }

    /// No native host.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn replace(&self, descriptor: Option<Value>) {
        *self.descriptor.write() = descriptor;
    }
}

impl HostDescriptorSource for StaticDescriptor {
    fn descriptor(&self) -> Option<Value> {
        self.descriptor.read().clone()
    }
}
