//! Telemetry: logging bootstrap and metric recorders.
//!
//! The pool itself only emits `tracing` events and `metrics` counters;
//! wiring them to an output is the embedding application's choice.
//! [`init_logging`] is a convenience bootstrap for applications without
//! their own subscriber setup.

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging (default for production).
    #[default]
    Json,
    /// Human-readable pretty printing (for development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format (JSON or Pretty).
    pub format: LogFormat,
    /// Filter directive, e.g. "info" or "dispatch_pool=trace".
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
        }
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("subscriber already initialized")]
    AlreadyInitialized,
}

/// Initialize the tracing subscriber with the given configuration.
///
/// This should be called once at application startup.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LogError::InvalidFilter(e.to_string()))?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
    .map_err(|_| LogError::AlreadyInitialized)
}

/// Record a spare worker joining a pool.
pub fn record_worker_spawned() {
    metrics::counter!("dispatch_workers_spawned_total").increment(1);
}

/// Record a growth attempt that failed to start a thread.
pub fn record_spawn_failure() {
    metrics::counter!("dispatch_spawn_failures_total").increment(1);
}

/// Record a command handed to the processor.
pub fn record_command_dispatched() {
    metrics::counter!("dispatch_commands_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_rejected() {
        let config = LogConfig {
            format: LogFormat::Pretty,
            level: "not a real directive!!!".to_string(),
        };
        assert!(matches!(
            init_logging(&config),
            Err(LogError::InvalidFilter(_))
        ));
    }

    #[test]
    fn second_initialization_is_rejected() {
        let config = LogConfig {
            format: LogFormat::Pretty,
            level: "info".to_string(),
        };
        // First call may lose the race against other tests installing a
        // subscriber; the second call must fail either way.
        let _ = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(LogError::AlreadyInitialized)
        ));
    }
}
