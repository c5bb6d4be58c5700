use crate::metrics::MetricSnapshot;
use serde::{Deserialize, Serialize};

/// Least-squares slopes in percentage points per sample.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
}

impl Trends {
    /// Fits each usage series of `window` (oldest first) against its sample index.
    /// Fewer than two samples yield all-zero slopes.
    pub fn from_window(window: &[MetricSnapshot]) -> Self {
        if window.len() < 2 {
            return Self::default();
        }
        let series = |f: fn(&MetricSnapshot) -> f64| -> Vec<f64> { window.iter().map(f).collect() };
        Self {
            cpu_usage: slope(&series(|s| s.cpu.usage_pct)),
            memory_usage: slope(&series(|s| s.memory.usage_pct)),
            disk_usage: slope(&series(|s| s.disk.usage_pct)),
        }
    }
}

/// First-degree least-squares slope of `values` against x = 0..n-1.
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - mean_x;
            (num + dx * (y - mean_y), den + dx * dx)
        });

    if den == 0.0 || !num.is_finite() {
        0.0
    } else {
        num / den
    }
}
