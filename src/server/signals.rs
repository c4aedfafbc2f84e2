use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::notifications::service::RelayService;

/// Reacts to operator signals until the process exits.
///
/// - `SIGUSR1` reloads the relay document from `relay_config_path` and logs
///   the new routes. A broken document is reported and the running
///   generation keeps serving.
/// - `SIGUSR2` logs the current routes.
#[cfg(unix)]
pub async fn listen_signals(relay: Arc<RelayService>, relay_config_path: PathBuf) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut reload, mut dump) = match (
        signal(SignalKind::user_defined1()),
        signal(SignalKind::user_defined2()),
    ) {
        (Ok(reload), Ok(dump)) => (reload, dump),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "Failed to install SIGUSR1/SIGUSR2 handlers.");
            return;
        }
    };

    loop {
        tokio::select! {
            Some(()) = reload.recv() => {
                info!(path = %relay_config_path.display(), "SIGUSR1 received, reloading relay config.");
                match relay.reload_from_file(&relay_config_path).await {
                    Ok(_) => relay.log_routes().await,
                    Err(e) => error!(error = %e, "Config reload failed; keeping the current configuration."),
                }
            }
            Some(()) = dump.recv() => {
                relay.log_routes().await;
            }
            else => break,
        }
    }
}

#[cfg(not(unix))]
pub async fn listen_signals(_relay: Arc<RelayService>, _relay_config_path: PathBuf) {
    std::future::pending::<()>().await
}

/// Resolves on Ctrl+C or `SIGTERM`.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler.");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler.");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down."),
        () = terminate => info!("Received SIGTERM, shutting down."),
    }
}
