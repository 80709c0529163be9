/// End-to-end tests for the bind → request → render pipeline.
///
/// The backend is an in-memory fake implementing `DashboardApi`, and the
/// display is a `RecordingSink`, so these tests cover the full flow of a
/// card activation without a server or terminal. HTTP transport is covered
/// separately in `http_tests.rs`.
use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use serde_json::{Value, json};

use querydeck::api::{DashboardApi, HealthReply, QueryDescriptor, QueryResult};
use querydeck::catalog::{self, CatalogView};
use querydeck::health::{HealthMonitor, HealthStatus};
use querydeck::params::{BoundParams, DateFields};
use querydeck::render::RecordingSink;
use querydeck::render::chart::NoChart;
use querydeck::render::table::{DISPLAY_ROW_CAP, TableView};
use querydeck::runner::{QueryRunner, RUNNING_STATUS, RunOutcome};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeBackend {
    healthy: Option<bool>,
    catalog: Vec<QueryDescriptor>,
    results: HashMap<String, QueryResult>,
    /// Every `run_query` call: id plus the params sent.
    requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeBackend {
    fn with_result(mut self, result: QueryResult) -> Self {
        self.results.insert(result.query_id.clone(), result);
        self
    }
}

impl DashboardApi for FakeBackend {
    fn health(&self) -> Result<HealthReply> {
        match self.healthy {
            Some(ok) => Ok(HealthReply { ok: Some(ok) }),
            None => anyhow::bail!("connection refused"),
        }
    }

    fn list_queries(&self) -> Result<Vec<QueryDescriptor>> {
        Ok(self.catalog.clone())
    }

    fn run_query(&self, query_id: &str, params: &BoundParams) -> Result<QueryResult> {
        self.requests.borrow_mut().push((
            query_id.to_string(),
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self.results
            .get(query_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("HTTP 404: Unknown query"))
    }
}

fn descriptor(id: &str, params: &[&str]) -> QueryDescriptor {
    QueryDescriptor {
        id: id.to_string(),
        title: format!("{id} title"),
        description: format!("{id} description"),
        params: params.iter().map(|s| s.to_string()).collect(),
        chart: None,
    }
}

fn result(id: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
    QueryResult {
        query_id: id.to_string(),
        title: None,
        description: None,
        columns: columns.iter().map(|s| s.to_string()).collect(),
        row_count: rows.len(),
        rows,
        params: serde_json::Map::new(),
        chart: None,
        raw: Value::Null,
    }
}

fn fields() -> DateFields {
    DateFields {
        start_date: "2024-01-01".to_string(),
        end_date: "2024-03-31".to_string(),
        start_month: "2023-10-01".to_string(),
        end_month: "2024-03-01".to_string(),
    }
}

fn trend_rows() -> Vec<Vec<Value>> {
    vec![
        vec![json!(1), json!("x"), json!(10)],
        vec![json!(2), json!("y"), json!(20)],
        vec![json!(3), json!("z"), json!(30)],
    ]
}

// ---------------------------------------------------------------------------
// Parameter binding on the wire
// ---------------------------------------------------------------------------

#[test]
fn request_carries_only_declared_params() {
    let backend = FakeBackend::default().with_result(result("ltv", &["cohort"], vec![]));
    let mut runner = QueryRunner::new(backend);
    let mut sink = RecordingSink::default();

    runner
        .run(&descriptor("ltv", &["start_month", "end_month"]), &fields(), &mut sink)
        .unwrap();

    let requests = runner.api().requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "ltv");
    assert_eq!(
        requests[0].1,
        vec![
            ("start_month".to_string(), "2023-10-01".to_string()),
            ("end_month".to_string(), "2024-03-01".to_string()),
        ]
    );
}

#[test]
fn unrecognized_param_is_skipped_with_notice() {
    let backend = FakeBackend::default().with_result(result("top", &["sku"], vec![]));
    let mut runner = QueryRunner::new(backend);
    let mut sink = RecordingSink::default();

    runner
        .run(&descriptor("top", &["start_date", "limit"]), &fields(), &mut sink)
        .unwrap();

    let requests = runner.api().requests.borrow();
    assert_eq!(requests[0].1.len(), 1);
    assert_eq!(sink.notices.len(), 1);
    assert!(sink.notices[0].contains("limit"));
}

// ---------------------------------------------------------------------------
// Status line, raw JSON and table
// ---------------------------------------------------------------------------

#[test]
fn status_line_reports_echoed_params() {
    let mut r = result("aov", &["week", "aov"], vec![]);
    r.params.insert("start_date".to_string(), json!("2024-01-07"));
    r.params.insert("end_date".to_string(), json!("2024-03-31"));
    let mut runner = QueryRunner::new(FakeBackend::default().with_result(r));
    let mut sink = RecordingSink::default();

    runner
        .run(&descriptor("aov", &["start_date", "end_date"]), &fields(), &mut sink)
        .unwrap();

    assert_eq!(sink.title.as_deref(), Some("aov title"));
    assert_eq!(
        sink.status.as_deref(),
        Some("0 rows · start_date=2024-01-07 · end_date=2024-03-31")
    );
    let raw: Value = serde_json::from_str(sink.raw_json.as_deref().unwrap()).unwrap();
    assert_eq!(raw["query_id"], "aov");
}

#[test]
fn raw_json_is_the_body_as_received() {
    let body = json!({
        "query_id": "q",
        "columns": ["a"],
        "rows": [[1]],
        "params": {},
        "chart": null,
        "generated_at": "2024-01-01"
    });
    let mut runner = QueryRunner::new(
        FakeBackend::default().with_result(QueryResult::from_body(body).unwrap()),
    );
    let mut sink = RecordingSink::default();

    runner
        .run(&descriptor("q", &[]), &fields(), &mut sink)
        .unwrap();

    let raw: Value = serde_json::from_str(sink.raw_json.as_deref().unwrap()).unwrap();
    let raw = raw.as_object().unwrap();
    assert!(raw.contains_key("chart"));
    assert!(raw["chart"].is_null());
    assert_eq!(raw["generated_at"], "2024-01-01");
    assert!(!raw.contains_key("row_count"));
    assert_eq!(sink.status.as_deref(), Some("0 rows"));
}

#[test]
fn table_is_capped_but_row_count_is_not() {
    let rows: Vec<Vec<Value>> = (0..500).map(|i| vec![json!(i), json!("v")]).collect();
    let mut runner =
        QueryRunner::new(FakeBackend::default().with_result(result("big", &["n", "s"], rows)));
    let mut sink = RecordingSink::default();

    let outcome = runner
        .run(&descriptor("big", &[]), &fields(), &mut sink)
        .unwrap();

    let RunOutcome::Rendered(summary) = outcome else {
        panic!("expected rendered outcome");
    };
    assert_eq!(summary.row_count, 500);
    assert_eq!(summary.displayed_rows, DISPLAY_ROW_CAP);
    assert_eq!(sink.table.as_ref().unwrap().row_count(), 400);
    assert!(sink.status.as_deref().unwrap().starts_with("500 rows"));
}

#[test]
fn empty_schema_renders_placeholder() {
    let mut runner =
        QueryRunner::new(FakeBackend::default().with_result(result("none", &[], vec![])));
    let mut sink = RecordingSink::default();

    runner
        .run(&descriptor("none", &[]), &fields(), &mut sink)
        .unwrap();

    assert!(matches!(sink.table, Some(TableView::Placeholder(_))));
    assert!(sink.chart.is_none());
}

// ---------------------------------------------------------------------------
// Chart heuristic through the runner
// ---------------------------------------------------------------------------

#[test]
fn chart_plots_third_column() {
    let mut runner = QueryRunner::new(
        FakeBackend::default().with_result(result("trend", &["d", "a", "b"], trend_rows())),
    );
    let mut sink = RecordingSink::default();

    runner
        .run(&descriptor("trend", &[]), &fields(), &mut sink)
        .unwrap();

    let chart = sink.chart.as_ref().unwrap();
    assert_eq!(chart.points.len(), 3);
    assert_eq!(chart.y_column, "b");
    assert_eq!(chart.label, "trend: b");
    assert_eq!(runner.chart().live_charts(), 1);
}

#[test]
fn two_column_result_charts_second_column() {
    let rows = vec![
        vec![json!("2024-01-01"), json!(5)],
        vec![json!("2024-01-02"), json!(6)],
        vec![json!("2024-01-03"), json!("7.5")],
    ];
    let mut runner =
        QueryRunner::new(FakeBackend::default().with_result(result("daily", &["day", "rev"], rows)));
    let mut sink = RecordingSink::default();

    runner
        .run(&descriptor("daily", &[]), &fields(), &mut sink)
        .unwrap();

    assert_eq!(sink.chart.as_ref().unwrap().y_column, "rev");
}

#[test]
fn single_column_result_has_no_chart() {
    let rows = vec![vec![json!(1)], vec![json!(2)], vec![json!(3)]];
    let mut runner =
        QueryRunner::new(FakeBackend::default().with_result(result("one", &["n"], rows)));
    let mut sink = RecordingSink::default();

    let outcome = runner
        .run(&descriptor("one", &[]), &fields(), &mut sink)
        .unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::Rendered(ref s) if s.no_chart == Some(NoChart::TooFewColumns)
    ));
    assert!(runner.chart().active().is_none());
}

#[test]
fn non_numeric_result_clears_previous_chart() {
    let words = vec![
        vec![json!(1), json!("x"), json!("high")],
        vec![json!(2), json!("y"), json!("low")],
        vec![json!(3), json!("z"), Value::Null],
    ];
    let backend = FakeBackend::default()
        .with_result(result("trend", &["d", "a", "b"], trend_rows()))
        .with_result(result("words", &["d", "a", "b"], words));
    let mut runner = QueryRunner::new(backend);
    let mut sink = RecordingSink::default();

    runner
        .run(&descriptor("trend", &[]), &fields(), &mut sink)
        .unwrap();
    assert!(sink.chart.is_some());

    runner
        .run(&descriptor("words", &[]), &fields(), &mut sink)
        .unwrap();
    assert!(sink.chart.is_none());
    assert_eq!(sink.chart_clears, 1);
    assert!(runner.chart().active().is_none());
    assert_eq!(runner.chart().live_charts(), 0);
}

#[test]
fn repeated_plots_leave_one_chart() {
    let mut runner = QueryRunner::new(
        FakeBackend::default().with_result(result("trend", &["d", "a", "b"], trend_rows())),
    );
    let mut sink = RecordingSink::default();

    for _ in 0..3 {
        runner
            .run(&descriptor("trend", &[]), &fields(), &mut sink)
            .unwrap();
        assert_eq!(runner.chart().live_charts(), 1);
    }
    assert_eq!(sink.charts_drawn, 3);
    assert_eq!(sink.chart_clears, 2);
    assert_eq!(runner.chart().active().unwrap().id, 3);
}

// ---------------------------------------------------------------------------
// Request sequencing and failures
// ---------------------------------------------------------------------------

#[test]
fn stale_response_is_discarded() {
    let backend = FakeBackend::default()
        .with_result(result("slow", &["d", "v"], vec![]))
        .with_result(result("fast", &["d", "a", "b"], trend_rows()));
    let mut runner = QueryRunner::new(backend);
    let mut sink = RecordingSink::default();

    let slow = runner.begin(&descriptor("slow", &[]), &fields(), &mut sink);
    let fast = runner.begin(&descriptor("fast", &[]), &fields(), &mut sink);
    assert_eq!(runner.latest_token(), 2);

    let fast_result = runner.fetch(&fast).unwrap();
    let slow_result = runner.fetch(&slow).unwrap();

    assert!(matches!(
        runner.deliver(&fast, &fast_result, &mut sink),
        RunOutcome::Rendered(_)
    ));
    assert_eq!(
        runner.deliver(&slow, &slow_result, &mut sink),
        RunOutcome::Stale { token: 1, latest: 2 }
    );

    assert!(sink.status.as_deref().unwrap().starts_with("3 rows"));
    assert_eq!(sink.chart.as_ref().unwrap().label, "fast: b");
}

#[test]
fn failed_request_propagates_and_leaves_running_status() {
    let mut runner = QueryRunner::new(FakeBackend::default());
    let mut sink = RecordingSink::default();

    let err = runner
        .run(&descriptor("missing", &[]), &fields(), &mut sink)
        .unwrap_err();

    assert!(err.to_string().contains("Unknown query"));
    assert_eq!(sink.status.as_deref(), Some(RUNNING_STATUS));
    assert!(sink.table.is_none());
}

// ---------------------------------------------------------------------------
// Catalog and health
// ---------------------------------------------------------------------------

#[test]
fn activating_a_card_runs_its_own_descriptor() {
    let backend = FakeBackend {
        catalog: vec![
            descriptor("first", &["start_date"]),
            descriptor("second", &["end_month"]),
        ],
        ..FakeBackend::default()
    }
    .with_result(result("second", &["m"], vec![]));

    let mut sink = RecordingSink::default();
    let mut view = CatalogView::new();
    view.render(catalog::refresh(&backend).unwrap(), &mut sink);
    assert_eq!(sink.cards.len(), 2);

    let mut runner = QueryRunner::new(backend);
    let card = view.card(2).unwrap().clone();
    card.activate(&mut runner, &fields(), &mut sink).unwrap();

    let requests = runner.api().requests.borrow();
    assert_eq!(requests[0].0, "second");
    assert_eq!(requests[0].1[0].0, "end_month");
}

#[test]
fn health_monitor_classifies_replies() {
    let cases = [
        (Some(true), HealthStatus::Ok),
        (Some(false), HealthStatus::Error),
        (None, HealthStatus::Offline),
    ];
    for (healthy, expected) in cases {
        let backend = FakeBackend {
            healthy,
            ..FakeBackend::default()
        };
        let mut monitor = HealthMonitor::new();
        let mut sink = RecordingSink::default();
        assert_eq!(monitor.start(&backend, &mut sink), expected);
        assert_eq!(sink.health.unwrap().status, expected);
    }
}
