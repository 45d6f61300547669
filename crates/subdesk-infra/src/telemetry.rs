//! Tracing initialization
//!
//! `RUST_LOG` wins over the per-binary default filter. Output goes to stderr
//! so command output on stdout stays machine readable.

use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format '{}'. Must be: pretty or json", other)),
        }
    }
}

impl LogFormat {
    /// Format from `SUBDESK_LOG_FORMAT`, pretty when unset or unknown.
    pub fn from_env() -> Self {
        std::env::var("SUBDESK_LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

/// Install the global subscriber with `default_filter` unless `RUST_LOG` is set.
pub fn init_telemetry(
    default_filter: &str,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    tracing::debug!(filter = %default_filter, ?format, "Tracing initialized");
    Ok(())
}
