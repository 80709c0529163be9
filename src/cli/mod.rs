//! CLI command implementations for querydeck.
//!
//! Provides subcommand handlers for:
//! - `querydeck` / `querydeck interactive` — card picker session
//! - `querydeck health` — one backend liveness check
//! - `querydeck list` — print the query catalog
//! - `querydeck run <id>` — run one query and render it
//! - `querydeck export --out DIR` — snapshot the catalog and every result
//! - `querydeck history` — recent runs from the run log
//! - `querydeck config show|init|set|reset` — configuration management

pub mod session;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::api::{DashboardApi, HttpBackend, QueryResult};
use crate::catalog::{self, CatalogView};
use crate::config::{self, QueryDeckConfig};
use crate::health::{self, HealthStatus};
use crate::history::{self, RunLogEntry};
use crate::params::{self, DateOverrides, defaults};
use crate::render::table::cell_text;
use crate::render::{RecordingSink, TerminalSink};
use crate::runner::QueryRunner;

pub use session::run_interactive;

/// Output format for catalog, result and history commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

fn terminal_sink(cfg: &QueryDeckConfig, raw: bool) -> TerminalSink {
    TerminalSink::new(raw || cfg.display.show_raw_json, cfg.display.chart_width)
}

// ---------------------------------------------------------------------------
// querydeck health
// ---------------------------------------------------------------------------

/// Check that the backend answers its liveness endpoint.
pub fn run_health(cfg: &QueryDeckConfig) -> Result<()> {
    let backend = HttpBackend::from_config(&cfg.api);

    println!("{}", "querydeck Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let report = health::check(&backend);
    print_health_item(
        "Backend",
        report.status == HealthStatus::Ok,
        &format!("{} ({})", report.message, backend.base_url()),
    );
    if let Some(detail) = &report.detail {
        println!("  {} {}", "Detail:".dimmed(), detail.dimmed());
    }
    print_health_item(
        "Status",
        report.status == HealthStatus::Ok,
        &report.status.to_string(),
    );

    let log_exists = history::run_log_path()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Run log",
        log_exists,
        &if log_exists {
            format!("{} entries", history::read_all_entries().len())
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<12} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// querydeck list
// ---------------------------------------------------------------------------

/// Print the query catalog.
pub fn run_list(cfg: &QueryDeckConfig, format: OutputFormat) -> Result<()> {
    let backend = HttpBackend::from_config(&cfg.api);
    let queries = catalog::refresh(&backend)?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "queries": queries });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => {
            println!("id,title,description,params");
            for q in &queries {
                println!(
                    "{},{},{},{}",
                    csv_field(&q.id),
                    csv_field(&q.title),
                    csv_field(&q.description),
                    csv_field(&q.params.join(" ")),
                );
            }
        }
        OutputFormat::Table => {
            let mut view = CatalogView::new();
            view.render(queries, &mut terminal_sink(cfg, false));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// querydeck run
// ---------------------------------------------------------------------------

/// Run one catalog query by id and render its result.
///
/// Date fields start from the defaults; `overrides` replace individual
/// fields. `json` prints the raw result, `csv` prints every row.
pub fn run_query(
    cfg: &QueryDeckConfig,
    query_id: &str,
    overrides: &DateOverrides,
    format: OutputFormat,
    raw: bool,
) -> Result<()> {
    let backend = HttpBackend::from_config(&cfg.api);
    let descriptor = catalog::refresh(&backend)?
        .into_iter()
        .find(|q| q.id == query_id)
        .with_context(|| {
            format!("unknown query '{query_id}' (run `querydeck list` to see the catalog)")
        })?;

    let mut fields = defaults::defaults_now();
    fields.apply_overrides(overrides);

    let mut runner = QueryRunner::new(backend).with_history(cfg.history.enabled);

    match format {
        OutputFormat::Table => {
            runner.run(&descriptor, &fields, &mut terminal_sink(cfg, raw))?;
        }
        OutputFormat::Json => {
            let (_, result) = runner.execute(&descriptor, &fields, &mut RecordingSink::default())?;
            println!("{}", serde_json::to_string_pretty(&result.body())?);
        }
        OutputFormat::Csv => {
            let (_, result) = runner.execute(&descriptor, &fields, &mut RecordingSink::default())?;
            print!("{}", result_to_csv(&result));
        }
    }

    Ok(())
}

/// Serialize every row of a result as CSV (no display cap).
pub fn result_to_csv(result: &QueryResult) -> String {
    let mut out = String::new();
    let header: Vec<String> = result.columns.iter().map(|c| csv_field(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(|v| csv_field(&cell_text(v))).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// querydeck export
// ---------------------------------------------------------------------------

/// Write `queries.json` plus one `<id>.json` per catalog query, each run
/// with the default date ranges.
///
/// A failing query is reported and skipped; the command fails at the end
/// if any query could not be exported.
pub fn run_export(cfg: &QueryDeckConfig, out_dir: &Path) -> Result<()> {
    let backend = HttpBackend::from_config(&cfg.api);
    let queries = catalog::refresh(&backend)?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let catalog_payload = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "queries": queries,
    });
    write_json(&out_dir.join("queries.json"), &catalog_payload)?;

    let fields = defaults::defaults_now();
    let mut failed = 0usize;
    for q in &queries {
        let bound = params::bind(&q.params, &fields);
        match backend.run_query(&q.id, &bound) {
            Ok(result) => {
                let path = out_dir.join(format!("{}.json", q.id));
                write_json(&path, &result.body())?;
                println!(
                    "  {} {:<28} {} rows",
                    "✓".green().bold(),
                    q.id,
                    result.row_count
                );
            }
            Err(e) => {
                failed += 1;
                println!("  {} {:<28} {}", "✗".red().bold(), q.id, format!("{e:#}").dimmed());
            }
        }
    }

    println!();
    println!(
        "Exported {} of {} queries to {}",
        queries.len() - failed,
        queries.len(),
        out_dir.display()
    );

    if failed > 0 {
        anyhow::bail!("{failed} query export(s) failed");
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize export")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

// ---------------------------------------------------------------------------
// querydeck history
// ---------------------------------------------------------------------------

/// Show the most recent runs from the run log.
pub fn run_history(limit: usize, format: OutputFormat) -> Result<()> {
    let entries = history::read_recent(limit);

    if entries.is_empty() {
        println!(
            "{}",
            "No runs logged yet. Run a query to start the history.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Csv => print_history_csv(&entries),
        OutputFormat::Table => print_history_table(&entries),
    }

    Ok(())
}

fn print_history_table(entries: &[RunLogEntry]) {
    println!("{}", "Recent Query Runs".bold().cyan());
    println!("{}", "=".repeat(70));
    println!(
        "  {:<20} {:<26} {:>8} {:>9} Status",
        "Time", "Query", "Rows", "Latency"
    );
    println!("  {}", "-".repeat(68));

    for entry in entries {
        let time = chrono::DateTime::parse_from_rfc3339(&entry.timestamp)
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| entry.timestamp.clone());
        let rows = entry
            .row_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = if entry.success {
            "ok".green()
        } else {
            "failed".red()
        };
        println!(
            "  {:<20} {:<26} {:>8} {:>7}ms {}",
            time, entry.query_id, rows, entry.latency_ms, status
        );
        if let Some(error) = &entry.error {
            println!("  {:<20} {}", "", error.dimmed());
        }
    }
}

fn print_history_csv(entries: &[RunLogEntry]) {
    println!("timestamp,query_id,row_count,latency_ms,success,error");
    for e in entries {
        println!(
            "{},{},{},{},{},{}",
            e.timestamp,
            csv_field(&e.query_id),
            e.row_count.map(|n| n.to_string()).unwrap_or_default(),
            e.latency_ms,
            e.success,
            csv_field(e.error.as_deref().unwrap_or("")),
        );
    }
}

// ---------------------------------------------------------------------------
// querydeck config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective querydeck Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.querydeck/config.toml", global_exists);
    print_source(".querydeck.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "QUERYDECK_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.querydeck/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
