//! # MiniKit Telemetry
//!
//! Logging initialisation shared by binaries and test harnesses that embed
//! the bridge. Library crates only emit `tracing` events; installing a
//! subscriber is left to the application.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mk_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MK_SERVICE_NAME` | `minikit-bridge` | Service name |
//! | `MK_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `MK_JSON_LOGS` | `false` | JSON output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid configuration: {0}")]
    Config(String),
}
