//! Route configuration and setup.
//!
//! Health checks live in [health](health).

mod health;

use crate::handlers;
use crate::middleware::{
    request_id_middleware,
    security_headers::{security_headers_middleware, SecurityHeadersConfig},
};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use waypoint_core::{Config, StorageBackend};

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let security_headers_config = Arc::new(SecurityHeadersConfig::new(config.is_production()));

    let http_concurrency_limit = config.max_concurrent_requests().max(1);
    let request_timeout_secs = config.request_timeout_secs().max(1);
    tracing::info!(
        http_concurrency_limit,
        request_timeout_secs,
        "HTTP concurrency limit and request timeout layers enabled"
    );

    let app = public_routes(state.clone())
        .merge(image_routes(&state))
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_secs)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn_with_state(
            security_headers_config,
            security_headers_middleware,
        ))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/health",
            get({
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async { health::health_check(state).await }
                }
            }),
        )
        .route("/live", get(health::liveness_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

fn image_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let mut router = Router::new()
        .route("/api/cache-image", get(handlers::cache_image::cache_image))
        .route("/api/image-proxy", get(handlers::image_proxy::image_proxy))
        .route("/api/link-preview", get(handlers::link_preview::link_preview))
        .route(
            "/api/backfill-vote-images",
            get(handlers::backfill::backfill_vote_images),
        );

    let serves_local_objects = state
        .ingest
        .storage
        .as_ref()
        .is_some_and(|s| s.backend_type() == StorageBackend::Local);
    if serves_local_objects {
        tracing::info!("Serving re-hosted objects from local storage under /storage");
        router = router.route(
            "/storage/{*key}",
            get(handlers::stored_object::stored_object),
        );
    }

    router
}
