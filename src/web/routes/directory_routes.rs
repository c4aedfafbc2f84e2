use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use crate::registry::{ChannelSummary, ClientSummary};
use crate::web::AppState;

/// Read-only listings of the current generation. Tokens and webhook URLs
/// are never part of the output.
pub fn create_directory_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/channels", get(list_channels))
        .route("/clients", get(list_clients))
}

async fn list_channels(State(app_state): State<Arc<AppState>>) -> Json<Vec<ChannelSummary>> {
    Json(app_state.relay.snapshot().await.channel_summaries())
}

async fn list_clients(State(app_state): State<Arc<AppState>>) -> Json<Vec<ClientSummary>> {
    Json(app_state.relay.snapshot().await.client_summaries())
}
