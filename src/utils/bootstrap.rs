//! Bootstrap utilities for the badge-ledger binary.
//!
//! Shared initialization code: tracing and ledger construction.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LOG_ENV_VAR};
use crate::interfaces::ledger::Result;
use crate::label::LabelRenderer;
use crate::services::Reconciliation;
use crate::storage;

/// Initialize tracing with BADGE_LEDGER_LOG environment variable.
///
/// Defaults to "info" level if BADGE_LEDGER_LOG is not set. Logs go to
/// stderr so command output on stdout stays machine-readable.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Open the configured ledger and wrap it in the reconciliation service.
pub async fn build_service(config: &Config) -> Result<Reconciliation> {
    let ledger = storage::init_storage(&config.storage).await?;
    Ok(Reconciliation::new(
        ledger,
        LabelRenderer::from_config(&config.labels),
    ))
}
