//! Initialization functions for tracing

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::tracing::config::{InstrumentationConfig, LogFormat};

/// Initialize tracing with the given configuration
///
/// `RUST_LOG` wins over the configured level when it is set.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_tracing(config: &InstrumentationConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?,
    }

    tracing::debug!(service = %config.service_name, "tracing initialized");
    Ok(())
}
