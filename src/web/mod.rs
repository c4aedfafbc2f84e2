use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::notifications::service::RelayService;
use crate::server::config::ServerConfig;
use crate::web::routes::{directory_routes, notify_routes};

pub mod error;
pub mod route;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayService>,
    pub config: Arc<ServerConfig>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(relay: Arc<RelayService>, config: Arc<ServerConfig>) -> Router {
    let app_state = Arc::new(AppState { relay, config });

    Router::new()
        .route("/health", get(health_check_handler))
        .merge(directory_routes::create_directory_router())
        .fallback(notify_routes::notify_channel)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
