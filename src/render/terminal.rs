//! Terminal adapter: prints each dashboard region to stdout with `colored`.
//!
//! Output is append-only, so "replacing" a region means printing its new
//! content. Clearing the chart area prints nothing.

use colored::Colorize;

use super::chart::ChartSeries;
use super::table::TableView;
use super::RenderSink;
use crate::api::QueryDescriptor;
use crate::catalog::QueryCard;
use crate::health::{HealthReport, HealthStatus};
use crate::render::table::cell_text;

/// Glyphs used for the sparkline, lowest to highest.
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Sink that writes to the terminal.
#[derive(Debug, Clone)]
pub struct TerminalSink {
    show_raw_json: bool,
    chart_width: usize,
}

impl TerminalSink {
    pub fn new(show_raw_json: bool, chart_width: usize) -> Self {
        Self {
            show_raw_json,
            chart_width: chart_width.max(8),
        }
    }

    /// Toggle the raw JSON region. Returns the new state.
    pub fn toggle_raw_json(&mut self) -> bool {
        self.show_raw_json = !self.show_raw_json;
        self.show_raw_json
    }
}

impl RenderSink for TerminalSink {
    fn health(&mut self, report: &HealthReport) {
        let dot = match report.status {
            HealthStatus::Ok => "●".green().bold(),
            HealthStatus::Unknown => "●".dimmed(),
            HealthStatus::Error | HealthStatus::Offline => "●".red().bold(),
        };
        println!("{} {}", dot, report.message);
    }

    fn cards(&mut self, cards: &[QueryCard]) {
        println!();
        println!("{}", "Queries".bold().cyan());
        println!("{}", "=".repeat(60));
        if cards.is_empty() {
            println!("  {}", "The backend returned no queries.".yellow());
            return;
        }
        for card in cards {
            print_card(card);
        }
    }

    fn title(&mut self, title: &str) {
        println!();
        println!("{}", title.bold().cyan());
        println!("{}", "=".repeat(60));
    }

    fn status(&mut self, line: &str) {
        println!("  {}", line.dimmed());
    }

    fn raw_json(&mut self, json: &str) {
        if self.show_raw_json {
            println!();
            println!("{}", "--- Raw JSON ---".dimmed());
            println!("{json}");
        }
    }

    fn table(&mut self, view: &TableView) {
        println!();
        for line in format_table(view) {
            println!("{line}");
        }
    }

    fn chart(&mut self, series: Option<&ChartSeries>) {
        let Some(series) = series else {
            return;
        };
        println!();
        for line in format_chart(series, self.chart_width) {
            println!("{line}");
        }
    }

    fn notice(&mut self, message: &str) {
        println!("  {} {}", "Note:".yellow(), message.dimmed());
    }
}

fn print_card(card: &QueryCard) {
    let QueryDescriptor {
        id,
        title,
        description,
        chart,
        ..
    } = &card.descriptor;

    let hint = chart
        .as_ref()
        .map(|c| format!(" [{}]", c.kind))
        .unwrap_or_default();
    println!(
        "  {:>3}  {} {}{}",
        format!("{}.", card.index),
        title.bold(),
        id.dimmed(),
        hint.dimmed()
    );
    if !description.is_empty() {
        println!("       {}", description);
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Lay out a table view as aligned text lines (without color codes on data).
pub fn format_table(view: &TableView) -> Vec<String> {
    let (header, rows) = match view {
        TableView::Placeholder(message) => return vec![format!("  {message}")],
        TableView::Grid { header, rows } => (header, rows),
    };

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(header, &widths));
    let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    lines.push(format!("  {}", "-".repeat(total)));
    lines.extend(rows.iter().map(|row| format_row(row, &widths)));
    lines
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect();
    format!("  {}", padded.join("  ").trim_end())
}

/// Draw a series as a labelled sparkline.
///
/// When there are more points than columns, each column shows the mean of
/// its bucket of points.
pub fn format_chart(series: &ChartSeries, width: usize) -> Vec<String> {
    let values = bucket_means(&series.points.iter().map(|p| p.y).collect::<Vec<_>>(), width);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    let spark: String = values
        .iter()
        .map(|v| {
            if span <= 0.0 {
                SPARK_LEVELS[SPARK_LEVELS.len() / 2]
            } else {
                let level = ((v - min) / span * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
                SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
            }
        })
        .collect();

    let first_x = series.points.first().map(|p| cell_text(&p.x)).unwrap_or_default();
    let last_x = series.points.last().map(|p| cell_text(&p.x)).unwrap_or_default();

    vec![
        format!("  {}", series.label.bold()),
        format!("  {:>12} ┤ {}", format_axis(max), spark),
        format!("  {:>12} ┤", format_axis(min)),
        format!(
            "  {:>12}   {} … {} ({} points)",
            series.x_column.dimmed(),
            first_x,
            last_x,
            series.points.len()
        ),
    ]
}

fn bucket_means(values: &[f64], width: usize) -> Vec<f64> {
    if values.len() <= width || width == 0 {
        return values.to_vec();
    }
    (0..width)
        .map(|col| {
            let start = col * values.len() / width;
            let end = ((col + 1) * values.len() / width).max(start + 1);
            let bucket = &values[start..end];
            bucket.iter().sum::<f64>() / bucket.len() as f64
        })
        .collect()
}

fn format_axis(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
