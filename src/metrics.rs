use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    /// Overall utilization measured across the sampling window.
    #[serde(rename = "usage")]
    pub usage_pct: f64,
    /// Share of the window spent in user mode (user + nice).
    #[serde(rename = "user")]
    pub user_pct: f64,
    /// Share of the window spent in kernel mode (system + irq + softirq).
    #[serde(rename = "system")]
    pub system_pct: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    #[serde(rename = "usage")]
    pub usage_pct: f64,
    #[serde(rename = "total")]
    pub total_bytes: u64,
    #[serde(rename = "available")]
    pub available_bytes: u64,
    #[serde(rename = "used")]
    pub used_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskMetrics {
    /// used / total * 100 for the monitored mount.
    #[serde(rename = "usage")]
    pub usage_pct: f64,
    #[serde(rename = "total")]
    pub total_bytes: u64,
    #[serde(rename = "used")]
    pub used_bytes: u64,
    #[serde(rename = "free")]
    pub free_bytes: u64,
}

/// Change against the previous capture, in percentage points.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDeltas {
    #[serde(rename = "memory_usage")]
    pub memory_usage_pct: f64,
    #[serde(rename = "disk_usage")]
    pub disk_usage_pct: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u128,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: DiskMetrics,
    pub deltas: MetricDeltas,
}

impl MetricSnapshot {
    /// Well-formed snapshot with every reading at zero, stamped now.
    pub fn zeroed() -> Self {
        Self {
            timestamp_ms: now_timestamp_ms(),
            ..Self::default()
        }
    }
}

pub fn now_timestamp_ms() -> u128 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(dur) => dur.as_millis(),
        Err(err) => {
            tracing::error!("SystemTime before UNIX_EPOCH: {}", err);
            0
        }
    }
}

/// used / total * 100, or 0.0 when total is zero.
pub fn percent_of(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}
