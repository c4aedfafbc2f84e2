use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::notifications::service::RelayService;

/// Posts the liveness message through the relay, forever.
///
/// The interval is re-read from the published registry before every sleep,
/// so a reload that changes `self_check_every_x_hours` takes effect after the
/// current wait.
pub async fn run_self_check(relay: Arc<RelayService>) {
    let interval_seconds = relay.self_check_interval().await.as_secs();
    info!(interval_seconds, "Self check task started.");
    loop {
        sleep(relay.self_check_interval().await).await;
        debug!("Sending self notification...");
        match relay.self_notify().await {
            Ok(()) => info!("Self notification sent."),
            Err(e) => error!(error = %e, "Error while sending self notification."),
        }
    }
}
