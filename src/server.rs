use crate::api;
use crate::config::{AppConfig, CONTACT_RELAY_PATH, LOADER_PATH};
use crate::forward::ContactForwarder;
use crate::pages::PageSource;
use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub type SharedForwarder = Arc<dyn ContactForwarder + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pages: Arc<dyn PageSource>,
    pub forwarder: SharedForwarder,
}

impl AppState {
    pub fn new(config: AppConfig, pages: Arc<dyn PageSource>, forwarder: SharedForwarder) -> Self {
        Self {
            config: Arc::new(config),
            pages,
            forwarder,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let enable_cors = state.config.enable_cors;
    let mut app = Router::new()
        .route(LOADER_PATH, get(api::serve_loader))
        .route("/support/config", get(api::get_widget_config))
        .route(CONTACT_RELAY_PATH, post(api::post_contact))
        .route("/healthz", get(api::healthz))
        .fallback(get(api::serve_page))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());
    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

pub async fn run(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down docs-support server");
}
