//! Query execution: bind → request → fan the result out to the display.
//!
//! Every invocation gets a request token from a monotonically increasing
//! counter. A result is only rendered if its token is still the latest one
//! issued, so a slow response can never overwrite a newer query's panels.
//!
//! ```text
//! begin()   bind params, issue token, show "Running…"
//! fetch()   GET /api/query/{id}?...
//! deliver() drop if stale, else status line + raw JSON + table + chart
//! ```

use std::time::Instant;

use anyhow::Result;

use crate::api::{DashboardApi, QueryDescriptor, QueryResult};
use crate::history;
use crate::params::{self, BoundParams, DateFields};
use crate::render::chart::{ChartHeuristic, NoChart};
use crate::render::{table, RenderSink};

/// Status text shown while a request is in flight.
pub const RUNNING_STATUS: &str = "Running…";

/// A request that has been issued but not yet rendered.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    pub token: u64,
    pub query_id: String,
    pub params: BoundParams,
}

/// What happened to a delivered result.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Rendered(RunSummary),
    /// A newer request was issued after this one; the result was dropped.
    Stale { token: u64, latest: u64 },
}

/// Summary of a rendered result.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub query_id: String,
    /// Total rows reported by the backend.
    pub row_count: usize,
    /// Rows placed in the grid (capped).
    pub displayed_rows: usize,
    /// Why no chart was drawn, if none was.
    pub no_chart: Option<NoChart>,
}

/// Runs catalog queries against a backend and renders their results.
#[derive(Debug)]
pub struct QueryRunner<A> {
    api: A,
    chart: ChartHeuristic,
    latest_token: u64,
    record_history: bool,
}

impl<A: DashboardApi> QueryRunner<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            chart: ChartHeuristic::new(),
            latest_token: 0,
            record_history: false,
        }
    }

    /// Append every run to the JSONL run log.
    pub fn with_history(mut self, enabled: bool) -> Self {
        self.record_history = enabled;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn chart(&self) -> &ChartHeuristic {
        &self.chart
    }

    /// Token of the most recently issued request (0 before the first).
    pub fn latest_token(&self) -> u64 {
        self.latest_token
    }

    /// Bind, fetch and render one query.
    ///
    /// Transport and parse failures propagate; the panels keep whatever
    /// they showed last (typically the "Running…" status).
    pub fn run(
        &mut self,
        descriptor: &QueryDescriptor,
        fields: &DateFields,
        sink: &mut dyn RenderSink,
    ) -> Result<RunOutcome> {
        let (pending, result) = self.execute(descriptor, fields, sink)?;
        Ok(self.deliver(&pending, &result, sink))
    }

    /// Bind and fetch without rendering the result. The run is still logged.
    pub fn execute(
        &mut self,
        descriptor: &QueryDescriptor,
        fields: &DateFields,
        sink: &mut dyn RenderSink,
    ) -> Result<(PendingQuery, QueryResult)> {
        let pending = self.begin(descriptor, fields, sink);

        let started = Instant::now();
        let fetched = self.fetch(&pending);
        let latency_ms = started.elapsed().as_millis() as u64;

        if self.record_history {
            history::log_run(&pending, fetched.as_ref(), latency_ms);
        }

        Ok((pending, fetched?))
    }

    /// Bind parameters, issue a new request token and show the running
    /// state.
    pub fn begin(
        &mut self,
        descriptor: &QueryDescriptor,
        fields: &DateFields,
        sink: &mut dyn RenderSink,
    ) -> PendingQuery {
        let bound = params::bind(&descriptor.params, fields);
        if !bound.ignored().is_empty() {
            sink.notice(&format!(
                "ignoring unrecognized parameter(s) declared by '{}': {}",
                descriptor.id,
                bound.ignored().join(", ")
            ));
        }

        self.latest_token += 1;

        sink.title(&descriptor.title);
        sink.status(RUNNING_STATUS);

        PendingQuery {
            token: self.latest_token,
            query_id: descriptor.id.clone(),
            params: bound,
        }
    }

    /// Issue the request for a pending query.
    pub fn fetch(&self, pending: &PendingQuery) -> Result<QueryResult> {
        self.api.run_query(&pending.query_id, &pending.params)
    }

    /// Render a result if its request is still the latest one.
    pub fn deliver(
        &mut self,
        pending: &PendingQuery,
        result: &QueryResult,
        sink: &mut dyn RenderSink,
    ) -> RunOutcome {
        if pending.token != self.latest_token {
            return RunOutcome::Stale {
                token: pending.token,
                latest: self.latest_token,
            };
        }

        if result.query_id != pending.query_id {
            sink.notice(&format!(
                "result is labelled '{}' but '{}' was requested",
                result.query_id, pending.query_id
            ));
        }

        sink.status(&result.status_line());
        sink.raw_json(&serde_json::to_string_pretty(&result.body()).unwrap_or_default());

        let view = table::render(&result.columns, &result.rows);
        sink.table(&view);

        let no_chart = self.chart.plot(result, sink);

        RunOutcome::Rendered(RunSummary {
            query_id: result.query_id.clone(),
            row_count: result.row_count,
            displayed_rows: view.row_count(),
            no_chart,
        })
    }
}
