//! # Structured Logging
//!
//! Environment-driven tracing setup for hosts that do not install their own
//! subscriber. Filter directives come from `PULSE_LOG` (falling back to
//! `RUST_LOG`, then `info`); `PULSE_LOG_JSON=true` switches the console
//! output to JSON lines for log shippers.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process
///
/// Safe to call repeatedly and from parallel tests; later calls are no-ops.
/// When the host application already installed a global subscriber this
/// leaves it in place.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let directives = log_directives();
        let json_output = json_output_enabled();

        let console_layer = (!json_output).then(|| {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(EnvFilter::new(directives.clone()))
        });
        let json_layer = json_output.then(|| {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(directives.clone()))
        });

        let subscriber = tracing_subscriber::registry()
            .with(console_layer)
            .with(json_layer);

        // try_init keeps an already-installed host subscriber in place
        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized, continuing with existing one"
            );
        }

        tracing::info!(
            directives = %directives,
            json_output = json_output,
            "🔧 MONITORING: Structured logging initialized"
        );
    });
}

/// Filter directives from the environment
fn log_directives() -> String {
    std::env::var("PULSE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string())
}

/// Whether JSON console output was requested
fn json_output_enabled() -> bool {
    std::env::var("PULSE_LOG_JSON")
        .map(|value| value.eq_ignore_ascii_case("true") || value == "1")
        .unwrap_or(false)
}
