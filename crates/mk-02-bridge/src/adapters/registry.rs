//! Fallback Adapter Registry.
//!
//! A single replaceable slot, owned by one bridge instance. Setting it is
//! last-writer-wins; nothing clears it except [`FallbackRegistry::clear_adapter`].

use crate::ports::outbound::FallbackAdapter;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

#[derive(Default)]
pub struct FallbackRegistry {
    slot: RwLock<Option<Arc<dyn FallbackAdapter>>>,
}

impl FallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter`, returning the one it replaced.
    pub fn set_adapter(&self, adapter: Arc<dyn FallbackAdapter>) -> Option<Arc<dyn FallbackAdapter>> {
        let name = adapter.name().to_string();
        let previous = self.slot.write().replace(adapter);
        match &previous {
            Some(old) => info!(adapter = %name, replaced = %old.name(), "Fallback adapter replaced"),
            None => info!(adapter = %name, "Fallback adapter registered"),
        }
        previous
    }

    pub fn get_adapter(&self) -> Option<Arc<dyn FallbackAdapter>> {
        self.slot.read().clone()
    }

    pub fn has_adapter(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Remove the adapter, e.g. when the hosting page is torn down.
    pub fn clear_adapter(&self) -> Option<Arc<dyn FallbackAdapter>> {
        let previous = self.slot.write().take();
        if let Some(old) = &previous {
            info!(adapter = %old.name(), "Fallback adapter cleared");
        }
        previous
    }
}
