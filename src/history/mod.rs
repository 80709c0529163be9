use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::QueryResult;
use crate::runner::PendingQuery;

// ---------------------------------------------------------------------------
// Run log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the run log (`~/.querydeck/run-log.jsonl`).
///
/// One line per executed query, successful or not. Read back by
/// `querydeck history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: String,
    pub query_id: String,
    /// Parameters as sent (not as echoed).
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub row_count: Option<usize>,
    pub latency_ms: u64,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}

impl RunLogEntry {
    /// Build an entry for a finished request.
    pub fn new(
        pending: &PendingQuery,
        outcome: Result<&QueryResult, &anyhow::Error>,
        latency_ms: u64,
    ) -> Self {
        let (row_count, error) = match outcome {
            Ok(result) => (Some(result.row_count), None),
            Err(e) => (None, Some(format!("{e:#}"))),
        };
        Self {
            timestamp: Utc::now().to_rfc3339(),
            query_id: pending.query_id.clone(),
            params: pending.params.to_json(),
            row_count,
            latency_ms,
            success: error.is_none(),
            error,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append a run to the log. Failures to write are ignored.
pub fn log_run(pending: &PendingQuery, outcome: Result<&QueryResult, &anyhow::Error>, latency_ms: u64) {
    let Some(path) = run_log_path() else {
        return;
    };
    let _ = append_entry(&path, &RunLogEntry::new(pending, outcome, latency_ms));
}

/// Read every entry in the run log. Malformed lines are skipped; a missing
/// file reads as empty.
pub fn read_all_entries() -> Vec<RunLogEntry> {
    run_log_path()
        .map(|path| read_entries(&path))
        .unwrap_or_default()
}

/// The most recent `limit` entries, oldest first.
pub fn read_recent(limit: usize) -> Vec<RunLogEntry> {
    let mut entries = read_all_entries();
    let skip = entries.len().saturating_sub(limit);
    entries.split_off(skip)
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_entry(path: &Path, entry: &RunLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

fn read_entries(path: &Path) -> Vec<RunLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<RunLogEntry>(&line).ok())
        .collect()
}

/// Return the path to the run log file.
pub fn run_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".querydeck").join("run-log.jsonl"))
}
