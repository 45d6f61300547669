use anyhow::Context;
use std::time::Duration;

/// Shared state of the forwarding handler.
#[derive(Clone, Debug)]
pub struct ProxyState {
    pub client: reqwest::Client,
    /// Upstream base URL without a trailing slash.
    pub target: String,
}

impl ProxyState {
    pub fn new(target: &str) -> anyhow::Result<Self> {
        // Redirects are passed back to the caller, not followed.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create upstream HTTP client")?;

        Ok(Self {
            client,
            target: target.trim_end_matches('/').to_string(),
        })
    }

    pub fn target_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.target, path_and_query)
    }
}
