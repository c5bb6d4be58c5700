use crate::alerts::{AlertEvent, AlertKey, Severity};
use crate::metrics::MetricSnapshot;
use crate::trends::Trends;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLabel {
    Healthy,
    Warning,
    Critical,
    /// Nothing has been collected yet.
    Unknown,
}

impl StatusLabel {
    /// Worst severity among the active alerts; healthy when none are active.
    pub fn from_active(active: &BTreeSet<AlertKey>) -> Self {
        match active.iter().map(|key| key.severity).max() {
            Some(Severity::Critical) => StatusLabel::Critical,
            Some(Severity::Warning) => StatusLabel::Warning,
            None => StatusLabel::Healthy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusLabel::Healthy => "healthy",
            StatusLabel::Warning => "warning",
            StatusLabel::Critical => "critical",
            StatusLabel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    /// RFC 3339 time at which this status was assembled.
    pub timestamp: String,
    pub metrics: MetricSnapshot,
    pub alerts: Vec<AlertKey>,
    pub status: StatusLabel,
    pub trends: Trends,
    pub events: Vec<AlertEvent>,
}

impl SystemStatus {
    /// Status reported before the first successful collection.
    pub fn empty() -> Self {
        Self {
            timestamp: now_rfc3339(),
            metrics: MetricSnapshot::zeroed(),
            alerts: Vec::new(),
            status: StatusLabel::Unknown,
            trends: Trends::default(),
            events: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonitoringStatus {
    pub is_monitoring: bool,
    /// Epoch milliseconds of the last recorded collection.
    pub last_check: Option<u128>,
    pub active_alerts: usize,
    pub metrics_collected: usize,
    pub events_logged: usize,
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
