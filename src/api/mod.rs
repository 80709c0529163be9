//! Wire types and the backend collaborator interface.
//!
//! The dashboard backend exposes three read endpoints:
//!
//! - `GET /api/health` → [`HealthReply`]
//! - `GET /api/queries` → [`Catalog`]
//! - `GET /api/query/{id}?start_date=..` → [`QueryResult`]
//!
//! Everything downstream of the client talks to the backend through the
//! [`DashboardApi`] trait so the binding and rendering pipeline can be
//! exercised without a live server.

pub mod client;

use std::borrow::Cow;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::params::BoundParams;

pub use client::HttpBackend;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A named, parameterized query declared by the backend catalog.
///
/// The client never constructs these outside of tests; they arrive whole
/// from `GET /api/queries` and replace the previous catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Declared parameter names, in declaration order.
    #[serde(default)]
    pub params: Vec<String>,
    /// Optional presentation hint (`{"type": "line"}`). Display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartHint>,
}

/// Backend-supplied chart hint attached to a descriptor or result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartHint {
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Response body of `GET /api/queries`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub queries: Vec<QueryDescriptor>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Tabular result of executing one query.
///
/// Cells are kept as raw JSON scalars; the table and chart stages decide
/// how to present them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub row_count: usize,
    /// Parameter values the backend actually used, in backend order.
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartHint>,
    /// The response body as received. `Null` for results built in code.
    #[serde(skip)]
    pub raw: Value,
}

impl QueryResult {
    /// Parse a response body, keeping the body itself for raw display.
    pub fn from_body(body: Value) -> serde_json::Result<Self> {
        let mut result: Self = serde_json::from_value(body.clone())?;
        result.raw = body;
        Ok(result)
    }

    /// The result as the backend sent it: unmodelled keys and explicit
    /// nulls included. Falls back to the typed fields when no body was kept.
    pub fn body(&self) -> Cow<'_, Value> {
        if self.raw.is_null() {
            Cow::Owned(serde_json::to_value(self).unwrap_or_default())
        } else {
            Cow::Borrowed(&self.raw)
        }
    }

    /// One-line summary of the result: row count plus the echoed params.
    ///
    /// Uses the backend's echoed parameters rather than what was sent, since
    /// the backend may normalize or default them.
    pub fn status_line(&self) -> String {
        let mut parts = vec![format!("{} rows", self.row_count)];
        parts.extend(
            self.params
                .iter()
                .map(|(key, value)| format!("{key}={}", scalar_text(value))),
        );
        parts.join(" · ")
    }
}

/// Render a JSON scalar the way the status line shows it: strings bare,
/// everything else in its JSON form.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Response body of `GET /api/health`. A missing flag counts as negative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReply {
    #[serde(default)]
    pub ok: Option<bool>,
}

// ---------------------------------------------------------------------------
// Collaborator interface
// ---------------------------------------------------------------------------

/// The backend as seen by the client.
///
/// Implemented over HTTP by [`HttpBackend`]; tests provide in-memory fakes.
pub trait DashboardApi {
    /// Liveness probe. `Err` means the backend could not be reached or the
    /// reply was not understood.
    fn health(&self) -> Result<HealthReply>;

    /// Fetch the full query catalog.
    fn list_queries(&self) -> Result<Vec<QueryDescriptor>>;

    /// Execute one catalog query with the bound parameters.
    fn run_query(&self, query_id: &str, params: &BoundParams) -> Result<QueryResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_deserializes_without_optional_fields() {
        let q: QueryDescriptor =
            serde_json::from_value(json!({"id": "aov_trend", "title": "AOV Trend"})).unwrap();
        assert_eq!(q.id, "aov_trend");
        assert!(q.params.is_empty());
        assert!(q.chart.is_none());
    }

    #[test]
    fn descriptor_reads_chart_hint() {
        let q: QueryDescriptor = serde_json::from_value(json!({
            "id": "shipping_sla",
            "title": "Shipping SLA",
            "description": "Delivery percentiles",
            "params": ["start_date", "end_date"],
            "chart": {"type": "bar"}
        }))
        .unwrap();
        assert_eq!(q.params, vec!["start_date", "end_date"]);
        assert_eq!(q.chart.unwrap().kind, "bar");
    }

    #[test]
    fn status_line_uses_echoed_params_in_backend_order() {
        let result: QueryResult = serde_json::from_value(json!({
            "query_id": "ltv_by_cohort",
            "columns": ["cohort"],
            "rows": [],
            "row_count": 12,
            "params": {"start_month": "2024-01-01", "end_month": "2024-06-01"}
        }))
        .unwrap();
        assert_eq!(
            result.status_line(),
            "12 rows · start_month=2024-01-01 · end_month=2024-06-01"
        );
    }

    #[test]
    fn status_line_without_params_is_just_the_count() {
        let result: QueryResult =
            serde_json::from_value(json!({"query_id": "q", "row_count": 0})).unwrap();
        assert_eq!(result.status_line(), "0 rows");
    }

    #[test]
    fn body_keeps_keys_the_struct_does_not_model() {
        let result = QueryResult::from_body(json!({
            "query_id": "q",
            "columns": ["a"],
            "rows": [[1]],
            "params": {},
            "chart": null,
            "generated_at": "2024-01-01"
        }))
        .unwrap();
        assert_eq!(result.columns, vec!["a"]);

        let body = result.body();
        assert!(body["chart"].is_null());
        assert!(body.as_object().unwrap().contains_key("chart"));
        assert_eq!(body["generated_at"], "2024-01-01");
        assert!(body.get("row_count").is_none());
    }

    #[test]
    fn body_without_kept_response_serializes_fields() {
        let result: QueryResult =
            serde_json::from_value(json!({"query_id": "q", "row_count": 3})).unwrap();
        assert_eq!(result.body()["row_count"], 3);
        assert!(result.body().get("raw").is_none());
    }

    #[test]
    fn health_reply_missing_flag_is_none() {
        let reply: HealthReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply.ok, None);
        let reply: HealthReply = serde_json::from_str(r#"{"ok": true, "db": 1}"#).unwrap();
        assert_eq!(reply.ok, Some(true));
    }
}
