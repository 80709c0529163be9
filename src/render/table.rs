//! Generic grid view of an arbitrary `(columns, rows)` result set.
//!
//! The grid shows at most [`DISPLAY_ROW_CAP`] rows. The cap is a display
//! limit only; the true total comes from the result's `row_count`.

use serde_json::Value;

/// Maximum number of rows placed in the grid.
pub const DISPLAY_ROW_CAP: usize = 400;

/// Text shown instead of a grid when the result has no columns.
pub const EMPTY_SCHEMA_PLACEHOLDER: &str = "No rows returned.";

/// Rendered table content handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    /// The result had no columns; a single informational row.
    Placeholder(String),
    /// Header cells plus up to [`DISPLAY_ROW_CAP`] rows of cell text.
    Grid {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

impl TableView {
    /// Number of data rows in the view (the placeholder counts as zero).
    pub fn row_count(&self) -> usize {
        match self {
            Self::Placeholder(_) => 0,
            Self::Grid { rows, .. } => rows.len(),
        }
    }
}

/// Build the grid for a result set.
///
/// Each call produces a complete view; sinks replace whatever they showed
/// before.
pub fn render(columns: &[String], rows: &[Vec<Value>]) -> TableView {
    if columns.is_empty() {
        return TableView::Placeholder(EMPTY_SCHEMA_PLACEHOLDER.to_string());
    }

    TableView::Grid {
        header: columns.to_vec(),
        rows: rows
            .iter()
            .take(DISPLAY_ROW_CAP)
            .map(|row| row.iter().map(cell_text).collect())
            .collect(),
    }
}

/// Text of a single cell: null is empty, strings are verbatim, everything
/// else uses its plain JSON form.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
