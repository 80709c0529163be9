//! Best-effort time-series line chart for arbitrary result sets.
//!
//! The heuristic is content-blind and fixed:
//!
//! - x axis = column 0
//! - y axis = column `min(2, last column)`; abort when that index is 0
//! - points whose y does not coerce to a finite number are dropped
//! - fewer than [`MIN_POINTS`] surviving points means no chart
//!
//! [`ChartHeuristic`] owns the single active chart slot. Every plot starts by
//! destroying the previous chart, so at most one chart is ever live.

use serde_json::Value;

use super::RenderSink;
use crate::api::QueryResult;

/// Minimum number of plottable points for a chart to be drawn.
pub const MIN_POINTS: usize = 3;

/// Preferred y-axis column index.
const PREFERRED_Y_INDEX: usize = 2;

/// Curve smoothing applied when drawing the line. Visual only.
pub const LINE_TENSION: f64 = 0.25;

/// One plotted point: the raw x cell and the coerced y value.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub x: Value,
    pub y: f64,
}

/// A single line series ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    /// `"<query id>: <y column>"`.
    pub label: String,
    pub x_column: String,
    pub y_column: String,
    pub points: Vec<ChartPoint>,
    /// Draw point markers. Always off; the series is a bare line.
    pub show_points: bool,
    pub tension: f64,
}

/// Why a result produced no chart. Never surfaced as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoChart {
    NoRows,
    TooFewColumns,
    TooFewPoints,
}

/// A chart instance occupying the slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveChart {
    /// Sequence number of the chart, unique per heuristic.
    pub id: u64,
    pub series: ChartSeries,
}

/// Owns the active chart slot and applies the plotting heuristic.
#[derive(Debug, Default)]
pub struct ChartHeuristic {
    active: Option<ActiveChart>,
    created: u64,
    destroyed: u64,
}

impl ChartHeuristic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `result` if its shape allows. The previous chart is torn down
    /// either way.
    ///
    /// Returns the reason no chart was drawn, if any.
    pub fn plot(&mut self, result: &QueryResult, sink: &mut dyn RenderSink) -> Option<NoChart> {
        match build_series(result) {
            Ok(series) => {
                self.replace(series, sink);
                None
            }
            Err(reason) => {
                self.destroy(sink);
                Some(reason)
            }
        }
    }

    /// Destroy-then-create: the only way a chart enters the slot.
    fn replace(&mut self, series: ChartSeries, sink: &mut dyn RenderSink) {
        self.destroy(sink);
        self.created += 1;
        let chart = ActiveChart {
            id: self.created,
            series,
        };
        sink.chart(Some(&chart.series));
        self.active = Some(chart);
    }

    /// Tear down the active chart, if there is one.
    pub fn destroy(&mut self, sink: &mut dyn RenderSink) {
        if self.active.take().is_some() {
            self.destroyed += 1;
            sink.chart(None);
        }
    }

    /// The chart currently in the slot.
    pub fn active(&self) -> Option<&ActiveChart> {
        self.active.as_ref()
    }

    /// Charts created and not yet destroyed. Never more than one.
    pub fn live_charts(&self) -> u64 {
        self.created - self.destroyed
    }
}

/// Apply the column heuristic to a result set.
pub fn build_series(result: &QueryResult) -> Result<ChartSeries, NoChart> {
    if result.rows.is_empty() {
        return Err(NoChart::NoRows);
    }

    let Some((x_idx, y_idx)) = axis_indices(result.columns.len()) else {
        return Err(NoChart::TooFewColumns);
    };

    let points: Vec<ChartPoint> = result
        .rows
        .iter()
        .filter_map(|row| {
            let y = row.get(y_idx).and_then(coerce_number)?;
            Some(ChartPoint {
                x: row.get(x_idx).cloned().unwrap_or(Value::Null),
                y,
            })
        })
        .collect();

    if points.len() < MIN_POINTS {
        return Err(NoChart::TooFewPoints);
    }

    let y_column = result.columns[y_idx].clone();
    Ok(ChartSeries {
        label: format!("{}: {}", result.query_id, y_column),
        x_column: result.columns[x_idx].clone(),
        y_column,
        points,
        show_points: false,
        tension: LINE_TENSION,
    })
}

/// `(x, y)` column indices for a result with `column_count` columns, or
/// `None` when the y axis would not come after the x axis.
pub fn axis_indices(column_count: usize) -> Option<(usize, usize)> {
    let last = column_count.checked_sub(1)?;
    let y_idx = PREFERRED_Y_INDEX.min(last);
    (y_idx > 0).then_some((0, y_idx))
}

/// Coerce a cell to a finite number.
///
/// Numbers pass through, numeric strings are parsed after trimming, and
/// booleans count as 1/0. Null, blank strings and anything else yield
/// `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}
