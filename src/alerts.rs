use crate::error::ConfigError;
use crate::metrics::MetricSnapshot;
use crate::storage::HistoryBuffer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Cpu,
    Memory,
    Disk,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::Cpu, Component::Memory, Component::Disk];

    pub fn as_str(self) -> &'static str {
        match self {
            Component::Cpu => "cpu",
            Component::Memory => "memory",
            Component::Disk => "disk",
        }
    }

    /// The usage percentage this component is judged on.
    pub fn usage_pct(self, snapshot: &MetricSnapshot) -> f64 {
        match self {
            Component::Cpu => snapshot.cpu.usage_pct,
            Component::Memory => snapshot.memory.usage_pct,
            Component::Disk => snapshot.disk.usage_pct,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered so that `Critical > Warning`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    pub component: Component,
    pub severity: Severity,
}

impl AlertKey {
    pub fn new(component: Component, severity: Severity) -> Self {
        Self {
            component,
            severity,
        }
    }
}

/// A newly triggered alert. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u128,
    pub component: Component,
    pub severity: Severity,
    #[serde(rename = "value")]
    pub observed_value: f64,
    #[serde(rename = "threshold")]
    pub threshold_value: f64,
    pub message: String,
}

/// Percent thresholds per component. A reading at or above a threshold breaches it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub cpu_warning: f64,
    pub cpu_critical: f64,
    pub memory_warning: f64,
    pub memory_critical: f64,
    pub disk_warning: f64,
    pub disk_critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_warning: 70.0,
            cpu_critical: 90.0,
            memory_warning: 80.0,
            memory_critical: 90.0,
            disk_warning: 80.0,
            disk_critical: 90.0,
        }
    }
}

impl Thresholds {
    pub fn get(&self, component: Component, severity: Severity) -> f64 {
        match (component, severity) {
            (Component::Cpu, Severity::Warning) => self.cpu_warning,
            (Component::Cpu, Severity::Critical) => self.cpu_critical,
            (Component::Memory, Severity::Warning) => self.memory_warning,
            (Component::Memory, Severity::Critical) => self.memory_critical,
            (Component::Disk, Severity::Warning) => self.disk_warning,
            (Component::Disk, Severity::Critical) => self.disk_critical,
        }
    }

    /// Critical is checked first; a component maps to at most one severity.
    pub fn severity_for(&self, component: Component, value: f64) -> Option<Severity> {
        if value >= self.get(component, Severity::Critical) {
            Some(Severity::Critical)
        } else if value >= self.get(component, Severity::Warning) {
            Some(Severity::Warning)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for component in Component::ALL {
            let warning = self.get(component, Severity::Warning);
            let critical = self.get(component, Severity::Critical);
            for (severity, value) in [(Severity::Warning, warning), (Severity::Critical, critical)] {
                if !(0.0..=100.0).contains(&value) {
                    return Err(ConfigError::InvalidThreshold {
                        key: format!("{component}_{severity}"),
                        value,
                    });
                }
            }
            if warning > critical {
                return Err(ConfigError::InvertedThresholds {
                    component: component.to_string(),
                    warning,
                    critical,
                });
            }
        }
        Ok(())
    }
}

/// Outcome of one evaluation cycle.
#[derive(Clone, Debug, Default)]
pub struct Evaluation {
    /// Events for keys absent from the previous active set, in component order.
    pub new_events: Vec<AlertEvent>,
    pub active: BTreeSet<AlertKey>,
}

pub struct AlertEngine {
    thresholds: Thresholds,
    active: BTreeSet<AlertKey>,
    events: HistoryBuffer<AlertEvent>,
}

impl AlertEngine {
    pub fn new(thresholds: Thresholds, event_capacity: usize) -> Self {
        Self {
            thresholds,
            active: BTreeSet::new(),
            events: HistoryBuffer::new(event_capacity),
        }
    }

    /// Rebuilds the active set from this snapshot alone and records an event
    /// for every key that was not already active. Keys that drop out clear
    /// silently.
    pub fn evaluate(&mut self, snapshot: &MetricSnapshot) -> Evaluation {
        let candidate: BTreeSet<AlertKey> = Component::ALL
            .into_iter()
            .filter_map(|component| {
                self.thresholds
                    .severity_for(component, component.usage_pct(snapshot))
                    .map(|severity| AlertKey::new(component, severity))
            })
            .collect();

        let mut new_events = Vec::new();
        for key in candidate.difference(&self.active) {
            let event = self.build_event(*key, snapshot);
            warn!(
                component = %key.component,
                severity = %key.severity,
                value = event.observed_value,
                threshold = event.threshold_value,
                "{}",
                event.message
            );
            self.events.push(event.clone());
            new_events.push(event);
        }

        self.active = candidate;
        Evaluation {
            new_events,
            active: self.active.clone(),
        }
    }

    fn build_event(&self, key: AlertKey, snapshot: &MetricSnapshot) -> AlertEvent {
        let observed_value = key.component.usage_pct(snapshot);
        let threshold_value = self.thresholds.get(key.component, key.severity);
        AlertEvent {
            timestamp_ms: snapshot.timestamp_ms,
            component: key.component,
            severity: key.severity,
            observed_value,
            threshold_value,
            message: format!(
                "{} alert: {} usage at {:.1}% (threshold: {:.1}%)",
                key.severity.as_str().to_uppercase(),
                key.component,
                observed_value,
                threshold_value
            ),
        }
    }

    pub fn active(&self) -> &BTreeSet<AlertKey> {
        &self.active
    }

    pub fn events(&self) -> &HistoryBuffer<AlertEvent> {
        &self.events
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}
