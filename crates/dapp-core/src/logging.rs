//! `tracing` subscriber setup for the host app.
//!
//! `RUST_LOG` overrides the level passed in by the host when it is set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::DappError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogFormat {
    /// Human-readable, for Xcode / logcat during development.
    Pretty,
    /// JSON lines.
    Json,
}

/// Install the global subscriber. Fails if one is already installed, which
/// happens when the host calls this twice.
pub fn init_logging(default_level: &str, format: LogFormat) -> Result<(), DappError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true))
            .try_init(),
    };
    result.map_err(|e| DappError::Internal(format!("logging already initialized: {e}")))?;

    tracing::info!("logging initialized (format={:?})", format);
    Ok(())
}
