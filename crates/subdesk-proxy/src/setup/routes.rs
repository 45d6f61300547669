use crate::handlers::{forward, health, log_request};
use crate::state::ProxyState;
use anyhow::Context;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use subdesk_core::config::ProxyConfig;
use subdesk_infra::request_id_middleware;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the proxy router: `/health` plus everything under `/api`.
pub fn setup_routes(config: &ProxyConfig) -> Result<Router, anyhow::Error> {
    let state = Arc::new(ProxyState::new(&config.target)?);
    let cors = setup_cors(config)?;

    let app = Router::new()
        .route("/health", get(health))
        .route("/api", any(forward))
        .route("/api/{*path}", any(forward))
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors);

    Ok(app)
}

/// Setup CORS configuration
///
/// Credentials are allowed, so a `*` origin is answered by echoing the
/// request's `Origin`.
pub fn setup_cors(config: &ProxyConfig) -> Result<CorsLayer, anyhow::Error> {
    let origin = if config.allows_any_origin() {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        AllowOrigin::mirror_request()
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid origin in SUBDESK_PROXY_CORS_ORIGINS")?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("environment"),
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true))
}
