//! Signal handling for graceful shutdown and config reload.

use crate::config::ConfigLoader;
use invl_core::config::SharedConfig;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Notify;

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C). If a handler cannot be
/// installed, only the other one is awaited.
pub async fn shutdown_signal() {
    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());

    match (sigterm, sigint) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                }
            }
        }
        (Ok(mut only), Err(e)) | (Err(e), Ok(mut only)) => {
            tracing::warn!(error = %e, "Failed to install a shutdown signal handler");
            only.recv().await;
            tracing::info!("Received shutdown signal, initiating graceful shutdown");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "No shutdown signal handler installed, falling back to Ctrl+C");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Spawns a task that listens for SIGHUP and reloads the configuration.
///
/// Admin, tenant and reconciliation sections are replaced in place. A
/// failed reload keeps the running configuration.
///
/// Returns a Notify that stops the task.
pub fn spawn_config_reload_handler(
    config: SharedConfig,
    config_loader: Arc<ConfigLoader>,
) -> Arc<Notify> {
    let shutdown_notify = Arc::new(Notify::new());
    let shutdown_notify_clone = shutdown_notify.clone();

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(sighup) => sighup,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGHUP handler, reload disabled");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!("Received SIGHUP, reloading configuration");
                    let loader = config_loader.clone();
                    // Hashing a new plaintext secret is CPU-bound.
                    let loaded = tokio::task::spawn_blocking(move || loader.reload()).await;
                    match loaded {
                        Ok(Ok(loaded_config)) => {
                            loaded_config.apply_to(&config).await;
                            tracing::info!("Configuration reloaded successfully");
                        }
                        Ok(Err(e)) => {
                            tracing::error!("Failed to reload configuration: {}", e);
                        }
                        Err(e) => {
                            tracing::error!("Configuration reload task failed: {}", e);
                        }
                    }
                }
                _ = shutdown_notify_clone.notified() => {
                    tracing::debug!("Config reload handler shutting down");
                    break;
                }
            }
        }
    });

    shutdown_notify
}
