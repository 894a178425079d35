//! Tracing subscriber setup
//!
//! Human readable output on stderr by default; one JSON object per line when
//! logs are shipped somewhere.

use ringrelay_domain::{RelayError, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_directive` when set.
///
/// # Errors
/// `Config` when the filter is invalid or a subscriber is already installed.
pub fn init_tracing(format: LogFormat, default_directive: &str) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(default_directive),
    }
    .map_err(|e| RelayError::Config(format!("invalid log filter: {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
            .try_init(),
    };

    installed.map_err(|e| RelayError::Config(format!("tracing already initialised: {e}")))
}
