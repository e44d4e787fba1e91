//! # Capability Negotiation
//!
//! Decides per command whether to go native, use the fallback adapter, or
//! fail.
//!
//! | host supports (cmd, ver) | channel | fallback covers cmd | result |
//! |---|---|---|---|
//! | yes | yes | any | `Native` |
//! | yes | no | yes | `Fallback` |
//! | yes | no | no | `TransportUnavailable` |
//! | no | any | yes | `Fallback` |
//! | no | any | no | `UnsupportedCommand` |
//!
//! A missing capability snapshot counts as "host supports nothing".

use super::errors::BridgeError;
use shared_types::{Command, HostCapabilities};

/// Path chosen for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Native,
    Fallback,
}

pub fn resolve_transport(
    command: Command,
    version: u32,
    capabilities: Option<&HostCapabilities>,
    native_available: bool,
    fallback_supports: bool,
) -> Result<Route, BridgeError> {
    let host_supports = capabilities.is_some_and(|caps| caps.supports(command, version));

    match (host_supports, native_available, fallback_supports) {
        (true, true, _) => Ok(Route::Native),
        (_, _, true) => Ok(Route::Fallback),
        (true, false, false) => Err(BridgeError::TransportUnavailable(command)),
        (false, _, false) => Err(BridgeError::UnsupportedCommand { command, version }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{DeviceOs, SupportedCommand};

    fn caps() -> HostCapabilities {
        HostCapabilities::new(
            1,
            DeviceOs::Ios,
            vec![
                SupportedCommand {
                    name: Command::WalletAuth,
                    supported_versions: vec![1, 2],
                },
                SupportedCommand {
                    name: Command::Pay,
                    supported_versions: vec![1],
                },
            ],
        )
    }

    #[test]
    fn test_supported_pairs_go_native_even_with_fallback() {
        let caps = caps();
        for (command, version) in [(Command::WalletAuth, 1), (Command::WalletAuth, 2), (Command::Pay, 1)] {
            for fallback in [false, true] {
                assert_eq!(
                    resolve_transport(command, version, Some(&caps), true, fallback),
                    Ok(Route::Native)
                );
            }
        }
    }

    #[test]
    fn test_absent_pairs_use_fallback_when_registered() {
        let caps = caps();
        assert_eq!(
            resolve_transport(Command::Pay, 2, Some(&caps), true, true),
            Ok(Route::Fallback)
        );
        assert_eq!(
            resolve_transport(Command::SignMessage, 1, Some(&caps), true, true),
            Ok(Route::Fallback)
        );
        assert_eq!(
            resolve_transport(Command::SignMessage, 1, None, false, true),
            Ok(Route::Fallback)
        );
    }

    #[test]
    fn test_absent_pairs_without_fallback_are_unsupported() {
        let caps = caps();
        for command in Command::ALL {
            for version in [1, 2, 3] {
                if caps.supports(command, version) {
                    continue;
                }
                assert_eq!(
                    resolve_transport(command, version, Some(&caps), true, false),
                    Err(BridgeError::UnsupportedCommand { command, version })
                );
                assert_eq!(
                    resolve_transport(command, version, None, false, false),
                    Err(BridgeError::UnsupportedCommand { command, version })
                );
            }
        }
    }

    #[test]
    fn test_missing_channel() {
        let caps = caps();
        assert_eq!(
            resolve_transport(Command::Pay, 1, Some(&caps), false, false),
            Err(BridgeError::TransportUnavailable(Command::Pay))
        );
        assert_eq!(
            resolve_transport(Command::Pay, 1, Some(&caps), false, true),
            Ok(Route::Fallback)
        );
    }
}
