//! OS signal handling.
//!
//! Ctrl+C (SIGINT) triggers graceful shutdown.

use crate::lifecycle::Shutdown;

/// Wait for Ctrl+C, then fire `shutdown`.
pub async fn shutdown_on_ctrl_c(shutdown: Shutdown) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(error) => {
            tracing::error!(%error, "Failed to install Ctrl+C handler");
            return;
        }
    }
    shutdown.trigger();
}
