//! Server startup and graceful shutdown

use anyhow::{Context, Result};
use axum::Router;
use subdesk_core::config::ProxyConfig;

fn print_banner(config: &ProxyConfig) {
    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("CORS Proxy Server Running");
    println!("{}", rule);
    println!("Local URL:    http://localhost:{}", config.port);
    println!("Proxying to:  {}", config.target);
    println!();
    println!("Point the subdesk base URL at http://localhost:{}", config.port);
    println!("and keep the workspace and API key as before.");
    println!("Press Ctrl+C to stop");
    println!("{}", rule);
}

/// Start the server with graceful shutdown
pub async fn start_server(config: &ProxyConfig, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(addr = %addr, "Starting proxy");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    print_banner(config);
    tracing::info!(target_url = %config.target, "Proxy ready and accepting connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C (SIGINT) or SIGTERM. A signal whose handler cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
