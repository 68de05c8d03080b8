mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

pub use state::AppState;

use crate::config::Config;

pub fn build_router(config: &Config) -> Router {
    router_with_state(Arc::new(AppState::new(config)))
}

pub fn router_with_state(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/parse", get(handlers::parse_link))
        .route("/history", get(handlers::list_history).post(handlers::create_history))
        .route("/analytics/event", post(handlers::analytics_event))
        // Never cache parsed destinations.
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl+C.
pub async fn start(config: &Config) -> std::io::Result<()> {
    let app = build_router(config);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("RidePrompt API listening on http://{}", addr);
    eprintln!("  RidePrompt API listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}
