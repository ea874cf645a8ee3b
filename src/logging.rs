//! Logging utilities for structured tracing

use crate::config::LogFormat;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "audit_enricher=debug,tower_http=info";

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the default filter. JSON output is meant for Cloud
/// Logging, which parses one JSON object per line.
pub fn init(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .flatten_event(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .init(),
    }
}

/// Deliveries slower than this are logged at warn level
const SLOW_OPERATION: Duration = Duration::from_secs(5);

/// Logs the wall time of an operation when dropped
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        let duration_ms = elapsed.as_millis() as u64;
        if elapsed >= SLOW_OPERATION {
            tracing::warn!(operation = self.operation, duration_ms, "Slow operation");
        } else {
            tracing::debug!(operation = self.operation, duration_ms, "Operation completed");
        }
    }
}

/// Log an error with structured context
pub fn log_error(operation: &str, error: &impl std::error::Error) {
    tracing::error!(
        operation = %operation,
        error = %error,
        error_kind = std::any::type_name_of_val(error),
        "Operation failed"
    );
}
