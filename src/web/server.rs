use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::api::track as track_handlers;
use super::api_doc::ApiDoc;
use super::live::LiveFrame;
use super::ui::handlers as ui_handlers;

#[derive(Clone)]
pub struct AppState {
    pub live: LiveFrame,
    /// How often the dashboard polls for a new frame.
    pub refresh: Duration,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(ui_handlers::dashboard))
        .route("/api/track/frame", get(track_handlers::frame))
        .route("/api/track/current", get(track_handlers::current))
        .route("/api/track/trajectory", get(track_handlers::trajectory))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bound before the tracker starts so an unusable address stops the program.
pub async fn bind(addr: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Web view listening on {}", listener.local_addr()?);
    Ok(listener)
}

pub async fn run_server(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
