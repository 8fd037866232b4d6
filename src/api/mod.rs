use axum::{Router, http::HeaderValue, middleware, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, Namespace};
use crate::services::AnimeService;
use crate::state::SharedState;

mod anime;
pub mod error;
pub mod observability;
pub mod types;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn anime_service(&self) -> &dyn AnimeService {
        self.shared.anime_service.as_ref()
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    namespace: &Namespace,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config, namespace).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, metrics_enabled) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.observability.metrics_enabled,
        )
    };

    let mut routes: Router<Arc<AppState>> = Router::new()
        .route("/", get(health_check))
        .route(
            "/anime",
            get(anime::list_anime)
                .post(anime::add_anime)
                .put(anime::update_anime)
                .patch(anime::update_anime_field)
                .delete(anime::remove_anime),
        )
        .route("/redirect", get(anime::redirect_to_anime));

    if metrics_enabled {
        routes = routes.route("/metrics", get(observability::get_metrics));
    }

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    routes
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

async fn health_check() -> &'static str {
    "OK"
}
