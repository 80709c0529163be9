//! Rendering pipeline: table and chart stages plus the display sinks.
//!
//! The stages compute what to show; a [`RenderSink`] decides how. The
//! terminal adapter prints to stdout, [`RecordingSink`] keeps the latest
//! content of every region in memory.
//!
//! Every sink call replaces the region's previous content.

pub mod chart;
pub mod table;
pub mod terminal;

use crate::catalog::QueryCard;
use crate::health::HealthReport;

pub use chart::{ChartHeuristic, ChartSeries};
pub use table::TableView;
pub use terminal::TerminalSink;

/// Display surface for the dashboard regions.
pub trait RenderSink {
    /// Health indicator shown at startup.
    fn health(&mut self, report: &HealthReport);

    /// Replace the set of selectable query cards.
    fn cards(&mut self, cards: &[QueryCard]);

    /// Results panel title.
    fn title(&mut self, title: &str);

    /// Status line under the title.
    fn status(&mut self, line: &str);

    /// Raw serialized result, for inspection.
    fn raw_json(&mut self, json: &str);

    /// Replace the result grid.
    fn table(&mut self, view: &TableView);

    /// Draw a chart, or clear the chart area with `None`.
    fn chart(&mut self, series: Option<&ChartSeries>);

    /// Non-fatal note for the operator (skipped parameters and the like).
    fn notice(&mut self, message: &str);
}

/// In-memory sink holding the latest content of each region.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub health: Option<HealthReport>,
    pub cards: Vec<QueryCard>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub raw_json: Option<String>,
    pub table: Option<TableView>,
    pub chart: Option<ChartSeries>,
    pub notices: Vec<String>,
    /// Number of `chart(None)` calls received.
    pub chart_clears: usize,
    /// Number of charts drawn.
    pub charts_drawn: usize,
}

impl RenderSink for RecordingSink {
    fn health(&mut self, report: &HealthReport) {
        self.health = Some(report.clone());
    }

    fn cards(&mut self, cards: &[QueryCard]) {
        self.cards = cards.to_vec();
    }

    fn title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn status(&mut self, line: &str) {
        self.status = Some(line.to_string());
    }

    fn raw_json(&mut self, json: &str) {
        self.raw_json = Some(json.to_string());
    }

    fn table(&mut self, view: &TableView) {
        self.table = Some(view.clone());
    }

    fn chart(&mut self, series: Option<&ChartSeries>) {
        match series {
            Some(series) => {
                self.charts_drawn += 1;
                self.chart = Some(series.clone());
            }
            None => {
                self.chart_clears += 1;
                self.chart = None;
            }
        }
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
