/// HTTP implementation of [`DashboardApi`] for the dashboard backend.
///
/// Uses the synchronous `ureq` client. One agent is built per backend and
/// reused for every request in the session. No timeout is applied unless
/// `api.timeout_ms` is set, so a hung backend leaves the caller waiting.
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use ureq::{Agent, AgentBuilder};

use super::{Catalog, DashboardApi, HealthReply, QueryDescriptor, QueryResult};
use crate::config::schema::ApiConfig;
use crate::params::BoundParams;

/// Error body returned by the backend for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Synchronous HTTP client for the dashboard backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    timeout: Option<Duration>,
    agent: Agent,
}

impl HttpBackend {
    /// Build a client for the given base URL (no trailing slash needed).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            agent: builder.build(),
        }
    }

    /// Build a client from the resolved `[api]` config section.
    pub fn from_config(config: &ApiConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        Self::new(&config.base_url, timeout)
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl DashboardApi for HttpBackend {
    fn health(&self) -> Result<HealthReply> {
        match self.agent.get(&self.url("/api/health")).call() {
            Ok(resp) => resp
                .into_json::<HealthReply>()
                .context("malformed health response"),
            // A JSON error body still counts as an answer from the API; only
            // unparseable bodies are treated as a transport failure.
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                serde_json::from_str::<HealthReply>(&body)
                    .with_context(|| format!("health check returned HTTP {code}"))
            }
            Err(e) => Err(e).context("health check request failed"),
        }
    }

    fn list_queries(&self) -> Result<Vec<QueryDescriptor>> {
        let resp = self
            .agent
            .get(&self.url("/api/queries"))
            .call()
            .map_err(describe_error)
            .context("failed to fetch query catalog")?;

        let catalog: Catalog = resp
            .into_json()
            .context("failed to parse query catalog")?;

        Ok(catalog.queries)
    }

    fn run_query(&self, query_id: &str, params: &BoundParams) -> Result<QueryResult> {
        let path = format!("/api/query/{}", urlencoding::encode(query_id));
        let mut request = self.agent.get(&self.url(&path));
        for (key, value) in params.iter() {
            request = request.query(key, value);
        }

        let resp = request
            .call()
            .map_err(describe_error)
            .with_context(|| format!("query '{query_id}' failed"))?;

        let body: serde_json::Value = resp
            .into_json()
            .with_context(|| format!("failed to read result of query '{query_id}'"))?;
        QueryResult::from_body(body)
            .with_context(|| format!("failed to parse result of query '{query_id}'"))
    }
}

/// Turn a `ureq` error into an `anyhow` error, lifting the backend's
/// `detail` message out of non-2xx bodies.
fn describe_error(error: ureq::Error) -> anyhow::Error {
    match error {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            match serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail)
            {
                Some(serde_json::Value::String(detail)) => {
                    anyhow::anyhow!("HTTP {code}: {detail}")
                }
                Some(detail) => anyhow::anyhow!("HTTP {code}: {detail}"),
                None => anyhow::anyhow!("HTTP {code}"),
            }
        }
        other => anyhow::Error::new(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_strips_trailing_slash() {
        let client = HttpBackend::new("http://localhost:8000/", None);
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/health"), "http://localhost:8000/api/health");
    }

    #[test]
    fn query_id_is_encoded_as_one_path_segment() {
        let path = format!("/api/query/{}", urlencoding::encode("rev?limit=5"));
        assert_eq!(path, "/api/query/rev%3Flimit%3D5");
        assert_eq!(urlencoding::encode("aov_trend"), "aov_trend");
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let config = ApiConfig::default();
        let client = HttpBackend::from_config(&config);
        assert_eq!(client.timeout(), None);

        let config = ApiConfig {
            timeout_ms: 1500,
            ..ApiConfig::default()
        };
        let client = HttpBackend::from_config(&config);
        assert_eq!(client.timeout(), Some(Duration::from_millis(1500)));
    }
}
