//! Boot-time liveness check of the backend.
//!
//! Runs once; there is no retry and no periodic re-check.

use std::fmt;

use crate::api::DashboardApi;
use crate::render::RenderSink;

/// Backend status as last observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HealthStatus {
    #[default]
    Unknown,
    Ok,
    Error,
    Offline,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Status plus the message shown next to the indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub message: String,
    /// Underlying failure, for offline reports.
    pub detail: Option<String>,
}

impl HealthReport {
    fn new(status: HealthStatus, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            detail: None,
        }
    }
}

pub const OK_MESSAGE: &str = "API online · database connected";
pub const ERROR_MESSAGE: &str = "API error";
pub const OFFLINE_MESSAGE: &str = "API offline (is the local service stack running?)";

/// Probe the backend once and classify the answer.
///
/// - `{"ok": true}` → ok
/// - any other parsed reply → error
/// - transport or parse failure → offline
pub fn check(api: &dyn DashboardApi) -> HealthReport {
    match api.health() {
        Ok(reply) if reply.ok == Some(true) => HealthReport::new(HealthStatus::Ok, OK_MESSAGE),
        Ok(_) => HealthReport::new(HealthStatus::Error, ERROR_MESSAGE),
        Err(e) => HealthReport {
            detail: Some(format!("{e:#}")),
            ..HealthReport::new(HealthStatus::Offline, OFFLINE_MESSAGE)
        },
    }
}

/// Holds the process-wide status, set once at startup.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    report: HealthReport,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the startup check and show the result.
    pub fn start(&mut self, api: &dyn DashboardApi, sink: &mut dyn RenderSink) -> HealthStatus {
        self.report = check(api);
        sink.health(&self.report);
        self.report.status
    }

    pub fn status(&self) -> HealthStatus {
        self.report.status
    }

    pub fn report(&self) -> &HealthReport {
        &self.report
    }
}
