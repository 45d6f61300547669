pub mod output;

use anyhow::Context;
use serde::Serialize;
use subdesk_core::error::{AppError, ErrorMetadata, LogLevel};
use subdesk_core::validation::{ResourceGrant, DURATION_PRESETS};
use subdesk_infra::telemetry::{init_telemetry, LogFormat};
use subdesk_infra::ErrorResponse;

/// Output format shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    if let Err(e) = init_telemetry("info", LogFormat::from_env()) {
        eprintln!("Failed to initialize tracing: {}", e);
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Parse a `--preset` value; only the offered durations are accepted.
pub fn parse_preset(value: &str) -> Result<u32, String> {
    let days: u32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number of days", value))?;
    if DURATION_PRESETS.contains(&days) {
        Ok(days)
    } else {
        Err(format!(
            "Preset must be one of: {}",
            DURATION_PRESETS
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}

/// Parse a `--resource Type:id[:features]` value.
pub fn parse_grant(value: &str) -> Result<ResourceGrant, String> {
    ResourceGrant::parse(value).map_err(|e| e.client_message())
}

/// Log a failed command at the level its error asks for.
pub fn log_error(err: &anyhow::Error) {
    let Some(app) = err.downcast_ref::<AppError>() else {
        tracing::error!(error = %format!("{:#}", err), "Command failed");
        return;
    };

    let error_type = app.error_type();
    let recoverable = app.is_recoverable();
    let detail = app.detailed_message();
    match app.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %detail, error_type, recoverable, "Command failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %detail, error_type, recoverable, "Command failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %detail, error_type, recoverable, "Command failed");
        }
    }
}

/// Error text for stderr: operator message plus what to do about it, or the
/// JSON error body when `format` is JSON.
pub fn render_error(err: &anyhow::Error, format: OutputFormat) -> String {
    let app = err.downcast_ref::<AppError>();

    if format == OutputFormat::Json {
        let body = match app {
            Some(app) => ErrorResponse::from(app),
            None => ErrorResponse::new("Error").with_message(format!("{:#}", err)),
        };
        return serde_json::to_string_pretty(&body)
            .unwrap_or_else(|_| format!("{{\"error\":\"{}\"}}", body.error));
    }

    match app {
        Some(app) => {
            let mut text = format!("Error: {}", app.client_message());
            if let Some(action) = app.suggested_action() {
                text.push_str(&format!("\nHint: {}", action));
            }
            if app.is_recoverable() {
                text.push_str("\nThis may succeed if retried.");
            }
            text
        }
        None => format!("Error: {:#}", err),
    }
}
