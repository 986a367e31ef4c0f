use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::elements::{spawn_refresh, ElementCache};
use crate::service::IssService;

use super::api::position as position_handlers;
use super::api::predict as predict_handlers;
use super::api_doc::ApiDoc;
use super::config::{Config, ConfigError};
use super::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.web.static_dir.clone();
    let index = ServeFile::new(static_dir.join("index.html"));

    Router::new()
        .route("/api/status", get(position_handlers::status))
        .route("/api/position", get(position_handlers::position))
        .route("/api/metrics", get(position_handlers::metrics))
        .route("/api/passes", get(predict_handlers::list_passes))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Static front end
        .route_service("/", index)
        .nest_service("/static", ServeDir::new(static_dir))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let bind_addr = config.web.bind.clone();
    let cache = ElementCache::new(config.max_age()?);
    let service = IssService::new(cache.clone(), config.service_settings()?);
    let refresh = spawn_refresh(config.element_source()?, cache, config.refresh_policy());

    let state = AppState::new(config, service)?;
    log::info!(
        "Home station {} at {:.4},{:.4}",
        state.home.label,
        state.home.position.latitude_deg,
        state.home.position.longitude_deg
    );
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    refresh.stop().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
