//! HTTP client for the vendor REST API.
//!
//! Every request carries the bearer key and the `environment` workspace
//! header. Responses are normalized to JSON values: JSON bodies are parsed,
//! plain text becomes `{ "message": text }` and empty bodies become `{}`.
//! Domain methods live in [`api`], endpoint probing in [`probe`].

pub mod api;
pub mod probe;

use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use subdesk_core::config::{ClientConfig, Settings};
use subdesk_core::error::{AppError, Result};
use subdesk_core::normalize::message_from_body;
use uuid::Uuid;

/// API version prefix shared by every domain endpoint.
pub const API_PREFIX: &str = "/api/v3";

/// HTTP client for the vendor API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    workspace: String,
    environment_id: Uuid,
}

impl ApiClient {
    /// Build a client from resolved configuration. Fails with
    /// `MissingApiKey` when no key is configured.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AppError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::InternalWithSource {
                message: "Failed to create HTTP client".to_string(),
                source: e.into(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            workspace: config.workspace.clone(),
            environment_id: config.environment_id,
        })
    }

    /// Create client from environment variables over the saved settings file.
    pub fn from_env() -> Result<Self> {
        let path = Settings::default_path()?;
        Self::from_settings_file(path)
    }

    pub fn from_settings_file(path: PathBuf) -> Result<Self> {
        let settings = Settings::load(&path)?;
        let config = ClientConfig::from_env(&settings)?;
        Self::new(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn environment_id(&self) -> Uuid {
        self.environment_id
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("environment", self.workspace.as_str())
            .header(header::CONTENT_TYPE, "application/json")
    }

    /// Authenticated request with no body handling. Used by probing, which
    /// needs the raw status and headers.
    pub async fn send_raw(&self, method: Method, path: &str) -> Result<Response> {
        let request = self.apply_headers(self.client.request(method, self.build_url(path)));
        request.send().await.map_err(transport_error)
    }

    /// Send a request and return the normalized JSON body.
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Value> {
        tracing::debug!(method = %method, path = %path, "API call");

        let mut request = self.apply_headers(self.client.request(method.clone(), self.build_url(path)));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(method = %method, path = %path, error = %e, "API request failed to send");
            transport_error(e)
        })?;

        let status = response.status();
        let data = read_body(response).await?;

        if !status.is_success() {
            let message = message_from_body(&data)
                .unwrap_or_else(|| format!("Request failed: {}", status.as_u16()));
            tracing::error!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                message = %message,
                "API error"
            );
            return Err(AppError::from_status(status.as_u16(), message));
        }

        tracing::debug!(method = %method, path = %path, status = status.as_u16(), "API response");
        Ok(data)
    }

    /// GET request with optional query parameters.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.request::<Value>(Method::GET, path, query, None).await
    }

    /// POST a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<Value> {
        self.request(Method::POST, path, query, Some(body)).await
    }
}

/// Map a reqwest send failure. Connect and timeout failures are the ones
/// a proxy can fix.
pub(crate) fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_connect() || e.is_timeout() {
        AppError::Connection(e.to_string())
    } else {
        AppError::InternalWithSource {
            message: "Failed to send request".to_string(),
            source: e.into(),
        }
    }
}

/// Read a response body into JSON following the content type.
async fn read_body(response: Response) -> Result<Value> {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    let text = response.text().await.map_err(|e| AppError::InternalWithSource {
        message: "Failed to read response body".to_string(),
        source: e.into(),
    })?;

    parse_body(is_json, &text)
}

fn parse_body(is_json: bool, text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(json!({}));
    }
    if is_json {
        return serde_json::from_str(text).map_err(AppError::from);
    }
    Ok(json!({ "message": text }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(api_key: Option<&str>) -> ClientConfig {
        ClientConfig {
            api_key: api_key.map(str::to_string),
            base_url: "http://localhost:3000/".to_string(),
            timeout: Duration::from_secs(5),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = ApiClient::new(&config(None)).unwrap_err();
        assert!(matches!(err, AppError::MissingApiKey));
        assert!(matches!(
            ApiClient::new(&config(Some("  "))).unwrap_err(),
            AppError::MissingApiKey
        ));
    }

    #[test]
    fn base_url_is_trimmed() {
        let client = ApiClient::new(&config(Some("key"))).unwrap();
        assert_eq!(client.build_url("/api/v3/flows"), "http://localhost:3000/api/v3/flows");
        assert_eq!(client.workspace(), "marinestream");
    }

    #[test]
    fn bodies_are_normalized() {
        assert_eq!(parse_body(true, "").unwrap(), json!({}));
        assert_eq!(parse_body(false, "").unwrap(), json!({}));
        assert_eq!(parse_body(false, "Forbidden").unwrap(), json!({"message": "Forbidden"}));
        assert_eq!(parse_body(true, "[1,2]").unwrap(), json!([1, 2]));
        assert!(matches!(parse_body(true, "{oops").unwrap_err(), AppError::Decode(_)));
    }
}
