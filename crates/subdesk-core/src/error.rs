//! Error types module
//!
//! All failures surfaced to the operator are unified under `AppError`. The
//! vendor API is opaque, so classification happens on transport outcome and
//! HTTP status instead of matching substrings of error text.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like rejected requests
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the operator.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "CONNECTION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same action may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the operator
    fn suggested_action(&self) -> Option<&'static str>;

    /// Operator-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Missing identifier: {0}")]
    MissingId(String),

    #[error("Plan {plan_id} was created but not assigned: {source}")]
    PartialSubscription {
        plan_id: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    /// Classify a non-success HTTP status into the matching variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => AppError::Unauthorized { status, message },
            404 => AppError::NotFound(message),
            _ => AppError::Api { status, message },
        }
    }

    /// HTTP status carried by the error, if it came from a vendor response.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Unauthorized { status, .. } | AppError::Api { status, .. } => Some(*status),
            AppError::PartialSubscription { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Get the error type name for detailed error output
    pub fn error_type(&self) -> &str {
        match self {
            AppError::MissingApiKey => "MissingApiKey",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized { .. } => "Unauthorized",
            AppError::Api { .. } => "Api",
            AppError::Connection(_) => "Connection",
            AppError::Decode(_) => "Decode",
            AppError::MissingId(_) => "MissingId",
            AppError::PartialSubscription { .. } => "PartialSubscription",
            AppError::Config(_) => "Config",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(crate::validation::first_validation_message(&err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(err: &AppError) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::MissingApiKey => (
            "MISSING_API_KEY",
            false,
            Some("Run `subdesk settings set --api-key <KEY>` or set SUBDESK_API_KEY"),
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the command arguments and try again"),
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            "NOT_FOUND",
            false,
            Some("Verify the identifier exists"),
            LogLevel::Debug,
        ),
        AppError::Unauthorized { .. } => (
            "UNAUTHORIZED",
            false,
            Some("Check the API key and workspace in settings"),
            LogLevel::Warn,
        ),
        AppError::Api { status, .. } if *status >= 500 => (
            "UPSTREAM_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::Api { .. } => (
            "REQUEST_REJECTED",
            false,
            Some("Check the request values against the vendor API"),
            LogLevel::Warn,
        ),
        AppError::Connection(_) => (
            "CONNECTION_ERROR",
            true,
            Some("Start subdesk-proxy and point the base URL at it"),
            LogLevel::Error,
        ),
        AppError::Decode(_) => (
            "DECODE_ERROR",
            false,
            Some("Run `subdesk probe` to inspect the response shape"),
            LogLevel::Warn,
        ),
        AppError::MissingId(_) => (
            "MISSING_ID",
            false,
            Some("Inspect the created entity with `subdesk plans list`"),
            LogLevel::Warn,
        ),
        AppError::PartialSubscription { .. } => (
            "PARTIAL_SUBSCRIPTION",
            true,
            Some("Retry the assignment with `subdesk subscription assign <plan-id> --company <uuid>`"),
            LogLevel::Warn,
        ),
        AppError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Check environment variables and the settings file"),
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MissingApiKey => "Please configure your API key in Settings".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized { ref message, .. } => {
                format!("Authentication failed: {}", message)
            }
            AppError::Api { ref message, .. } => message.clone(),
            AppError::Connection(_) => "Connection blocked. Try using the proxy server.".to_string(),
            AppError::Decode(_) => "Unexpected response from the API".to_string(),
            AppError::MissingId(ref msg) => msg.clone(),
            AppError::PartialSubscription {
                ref plan_id,
                ref source,
            } => format!(
                "Plan {} was created but could not be assigned: {}",
                plan_id,
                source.client_message()
            ),
            AppError::Config(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal error".to_string()
            }
        }
    }
}
