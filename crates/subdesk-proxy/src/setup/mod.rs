//! Proxy setup: routes, CORS and server lifecycle

pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use subdesk_core::config::ProxyConfig;
use subdesk_infra::telemetry::{init_telemetry, LogFormat};

/// Initialize telemetry and build the router.
pub fn initialize_app(config: &ProxyConfig) -> Result<axum::Router> {
    init_telemetry("subdesk_proxy=debug,subdesk_infra=debug,tower_http=debug", LogFormat::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        target_url = %config.target,
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    routes::setup_routes(config).context("Failed to set up routes")
}
