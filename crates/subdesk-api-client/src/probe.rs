//! Endpoint probing
//!
//! Tries candidate endpoint paths against the vendor API and reports which
//! ones answer and what their payloads look like.

use crate::{ApiClient, API_PREFIX};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use subdesk_core::error::Result;

/// Delay between two probes.
pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_millis(500);

/// Characters of a failed body kept in the report.
const BODY_PREVIEW_CHARS: usize = 100;

/// Candidate paths; `{ecosystem}` is replaced by the workspace.
pub const CANDIDATE_TEMPLATES: &[&str] = &[
    "/api/v3/environment/{ecosystem}/subscriptions",
    "/api/v3/environment/{ecosystem}/plans",
    "/api/v3/subscriptions",
    "/api/v3/diana/subscriptions",
    "/api/subscriptions",
    "/subscriptions",
    "/v3/subscriptions",
    "/api/v3/companies/{ecosystem}/subscriptions",
    "/api/v3/environment/{ecosystem}/company-subscriptions",
];

/// Outline of a successful response body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResponseShape {
    pub is_array: bool,
    pub keys: Vec<String>,
    pub length: Option<usize>,
    pub first_item_keys: Vec<String>,
    pub plans_length: Option<usize>,
}

fn object_keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

impl ResponseShape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self {
                is_array: true,
                keys: (0..items.len()).map(|i| i.to_string()).collect(),
                length: Some(items.len()),
                first_item_keys: items.first().map(object_keys).unwrap_or_default(),
                plans_length: None,
            },
            other => Self {
                is_array: false,
                keys: object_keys(other),
                length: None,
                first_item_keys: Vec::new(),
                plans_length: other.get("plans").and_then(Value::as_array).map(Vec::len),
            },
        }
    }
}

/// What happened when one endpoint was probed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success { status: u16, shape: ResponseShape },
    Failed { status: u16, body_preview: String },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProbeResult {
    pub endpoint: String,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Success { .. })
    }

    /// Status code or error text for a failed probe.
    pub fn failure_reason(&self) -> Option<String> {
        match &self.outcome {
            ProbeOutcome::Success { .. } => None,
            ProbeOutcome::Failed { status, .. } => Some(status.to_string()),
            ProbeOutcome::Error { message } => Some(message.clone()),
        }
    }
}

/// Results of a probe run split into working and failed endpoints.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProbeReport {
    pub working: Vec<ProbeResult>,
    pub failed: Vec<ProbeResult>,
}

impl ProbeReport {
    pub fn push(&mut self, result: ProbeResult) {
        if result.is_success() {
            self.working.push(result);
        } else {
            self.failed.push(result);
        }
    }

    pub fn total(&self) -> usize {
        self.working.len() + self.failed.len()
    }
}

/// Outcome of the single plans-endpoint check.
#[derive(Debug, Clone, Serialize)]
pub struct QuickTestReport {
    pub endpoint: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub shape: Option<ResponseShape>,
    pub body_preview: Option<String>,
}

fn preview(text: &str) -> String {
    text.chars().take(BODY_PREVIEW_CHARS).collect()
}

impl ApiClient {
    /// Substitute the workspace into a candidate template.
    pub fn expand_template(&self, template: &str) -> String {
        template.replace("{ecosystem}", self.workspace())
    }

    /// Probe one endpoint template with an authenticated GET.
    pub async fn probe_endpoint(&self, template: &str) -> ProbeResult {
        let endpoint = self.expand_template(template);
        tracing::info!(endpoint = %endpoint, "Probing endpoint");

        let outcome = match self.send_raw(Method::GET, &endpoint).await {
            Err(e) => ProbeOutcome::Error {
                message: e.to_string(),
            },
            Ok(response) => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                if status.is_success() {
                    match serde_json::from_str::<Value>(&text) {
                        Ok(value) => ProbeOutcome::Success {
                            status: status.as_u16(),
                            shape: ResponseShape::of(&value),
                        },
                        Err(e) => ProbeOutcome::Error {
                            message: format!("Response is not JSON: {}", e),
                        },
                    }
                } else {
                    ProbeOutcome::Failed {
                        status: status.as_u16(),
                        body_preview: preview(&text),
                    }
                }
            }
        };

        ProbeResult { endpoint, outcome }
    }

    /// Probe every template in order, pausing `delay` between requests.
    pub async fn probe_all(&self, templates: &[String], delay: Duration) -> ProbeReport {
        let mut report = ProbeReport::default();
        for (i, template) in templates.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }
            report.push(self.probe_endpoint(template).await);
        }

        tracing::info!(
            working = report.working.len(),
            failed = report.failed.len(),
            "Probe run finished"
        );
        report
    }

    /// One GET of the plans endpoint with status, headers and shape.
    pub async fn quick_test(&self) -> Result<QuickTestReport> {
        let endpoint = format!("{}/environment/{}/subscriptions", API_PREFIX, self.workspace());
        let response = self.send_raw(Method::GET, &endpoint).await?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect();
        let text = response.text().await.unwrap_or_default();

        let (shape, body_preview) = match serde_json::from_str::<Value>(&text) {
            Ok(value) if status.is_success() => (Some(ResponseShape::of(&value)), None),
            _ => (None, Some(preview(&text))),
        };

        Ok(QuickTestReport {
            endpoint,
            status: status.as_u16(),
            headers,
            shape,
            body_preview,
        })
    }
}

/// Default candidate templates as owned strings.
pub fn default_templates() -> Vec<String> {
    CANDIDATE_TEMPLATES.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_shape() {
        let shape = ResponseShape::of(&json!([{"id": "p-1", "displayName": "A"}]));
        assert!(shape.is_array);
        assert_eq!(shape.length, Some(1));
        assert_eq!(shape.first_item_keys, vec!["displayName", "id"]);
    }

    #[test]
    fn object_shape_counts_plans() {
        let shape = ResponseShape::of(&json!({"plans": [1, 2, 3], "total": 3}));
        assert!(!shape.is_array);
        assert_eq!(shape.keys, vec!["plans", "total"]);
        assert_eq!(shape.plans_length, Some(3));
    }

    #[test]
    fn preview_is_truncated_by_chars() {
        let long = "é".repeat(150);
        assert_eq!(preview(&long).chars().count(), 100);
    }

    #[test]
    fn report_splits_results() {
        let mut report = ProbeReport::default();
        report.push(ProbeResult {
            endpoint: "/a".to_string(),
            outcome: ProbeOutcome::Failed {
                status: 404,
                body_preview: String::new(),
            },
        });
        report.push(ProbeResult {
            endpoint: "/b".to_string(),
            outcome: ProbeOutcome::Error {
                message: "refused".to_string(),
            },
        });
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].failure_reason().as_deref(), Some("404"));
        assert_eq!(report.total(), 2);
    }
}
