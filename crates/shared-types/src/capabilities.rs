//! # Host Capabilities
//!
//! Snapshot of what the native host advertises: its app version, the device
//! OS, and which commands (at which versions) it can run.
//!
//! The host injects a descriptor object before the bridge installs. Its
//! absence is the signal that no native host is present.

use crate::commands::Command;
use crate::errors::WireError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceOs {
    Ios,
    Android,
}

/// One entry of the host's supported command list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedCommand {
    pub name: Command,
    pub supported_versions: Vec<u32>,
}

/// Raw descriptor shape as injected by the host.
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    world_app_version: u32,
    device_os: String,
    #[serde(default)]
    supported_commands: Vec<RawSupportedCommand>,
}

#[derive(Debug, Deserialize)]
struct RawSupportedCommand {
    name: String,
    #[serde(default)]
    supported_versions: Vec<u32>,
}

/// Immutable capability snapshot for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCapabilities {
    pub version: u32,
    pub os: DeviceOs,
    commands: BTreeMap<Command, Vec<u32>>,
}

impl HostCapabilities {
    /// Build a snapshot. A command listed more than once gets the union of
    /// its version lists.
    pub fn new(version: u32, os: DeviceOs, supported: Vec<SupportedCommand>) -> Self {
        let mut commands: BTreeMap<Command, Vec<u32>> = BTreeMap::new();
        for entry in supported {
            match commands.entry(entry.name) {
                Entry::Vacant(slot) => {
                    slot.insert(entry.supported_versions);
                }
                Entry::Occupied(mut slot) => {
                    warn!(command = %entry.name, "Host lists command twice, merging versions");
                    let versions = slot.get_mut();
                    for v in entry.supported_versions {
                        if !versions.contains(&v) {
                            versions.push(v);
                        }
                    }
                }
            }
        }
        Self {
            version,
            os,
            commands,
        }
    }

    /// Parse the host descriptor.
    ///
    /// Returns `Ok(None)` when the descriptor is absent (`null`), meaning no
    /// native host is present. Unknown command names are skipped.
    pub fn from_descriptor(descriptor: &Value) -> Result<Option<Self>, WireError> {
        if descriptor.is_null() {
            return Ok(None);
        }

        let raw = RawDescriptor::deserialize(descriptor)
            .map_err(|e| WireError::Malformed(e.to_string()))?;

        let os = match raw.device_os.to_ascii_lowercase().as_str() {
            "ios" => DeviceOs::Ios,
            "android" => DeviceOs::Android,
            other => return Err(WireError::UnknownOs(other.to_string())),
        };

        let mut supported = Vec::with_capacity(raw.supported_commands.len());
        for entry in raw.supported_commands {
            match Command::from_name(&entry.name) {
                Some(name) => supported.push(SupportedCommand {
                    name,
                    supported_versions: entry.supported_versions,
                }),
                None => debug!(command = %entry.name, "Ignoring unknown host command"),
            }
        }

        Ok(Some(Self::new(raw.world_app_version, os, supported)))
    }

    /// Whether the host runs `command` at `version`.
    #[must_use]
    pub fn supports(&self, command: Command, version: u32) -> bool {
        self.commands
            .get(&command)
            .is_some_and(|versions| versions.contains(&version))
    }

    /// Versions the host advertises for `command` (empty if absent).
    #[must_use]
    pub fn versions(&self, command: Command) -> &[u32] {
        self.commands.get(&command).map_or(&[], Vec::as_slice)
    }

    /// Advertised commands as a list.
    pub fn supported_commands(&self) -> Vec<SupportedCommand> {
        self.commands
            .iter()
            .map(|(name, versions)| SupportedCommand {
                name: *name,
                supported_versions: versions.clone(),
            })
            .collect()
    }
}
