//! # Structured Logging Module
//!
//! Opt-in tracing-subscriber bootstrap for hosts that have not installed
//! their own subscriber. Lifecycle logging itself is ambient: every module
//! logs through `tracing` with the component path as a structured field, so
//! a host-provided subscriber works just as well.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-driven filtering.
///
/// Safe to call more than once; if a global subscriber is already installed
/// the call is a no-op.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_log_level()));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(filter),
        );

        // A host may already have installed a global subscriber.
        if subscriber.try_init().is_err() {
            tracing::debug!(
                "global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }
    });
}

/// Log level used when `RUST_LOG` is unset.
fn default_log_level() -> String {
    match std::env::var("ASSEMBLY_ENV").as_deref() {
        Ok("production") => "info".to_string(),
        _ => "debug".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
    }
}
