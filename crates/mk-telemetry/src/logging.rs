//! Subscriber installation.
//!
//! JSON output carries `timestamp`, `level`, `target`, the message and any
//! structured fields (`request_id`, `command`, ...). Human-readable output is
//! the default `fmt` layout.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Handle returned by [`init_logging`].
#[derive(Debug)]
pub struct LoggingGuard {
    /// `true` when a global subscriber was already installed and this call
    /// left it in place.
    pub already_initialized: bool,
    service_name: String,
}

impl LoggingGuard {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Install the global `tracing` subscriber.
///
/// A second call (or a subscriber installed elsewhere) is not an error;
/// the returned guard reports `already_initialized`.
pub fn init_logging(config: &TelemetryConfig) -> Result<LoggingGuard, TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log level '{}': {e}", config.log_level)))?;

    let result = if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(config.ansi);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    };

    let already_initialized = result.is_err();
    if !already_initialized {
        tracing::info!(
            service = %config.service_name,
            json_logs = config.json_logs,
            "Logging initialized"
        );
    }

    Ok(LoggingGuard {
        already_initialized,
        service_name: config.service_name.clone(),
    })
}
