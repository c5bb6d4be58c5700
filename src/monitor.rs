use crate::alerts::{AlertEngine, AlertEvent, AlertKey};
use crate::config::MonitorConfig;
use crate::metrics::MetricSnapshot;
use crate::sampler::{MetricSource, Sampler, SysinfoSource};
use crate::status::{now_rfc3339, MonitoringStatus, StatusLabel, SystemStatus};
use crate::storage::HistoryBuffer;
use crate::trends::Trends;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

struct MonitorState {
    history: HistoryBuffer<MetricSnapshot>,
    alerts: AlertEngine,
    last_check: Option<u128>,
}

/// Samples the host, keeps bounded history and evaluates alerts.
///
/// Collections are serialized by the sampler mutex. History and alert state
/// live behind one `RwLock`, written once per collection, so readers always
/// see a complete update.
pub struct Monitor {
    config: MonitorConfig,
    sampler: Mutex<Sampler>,
    state: RwLock<MonitorState>,
    monitoring: AtomicBool,
}

impl Monitor {
    /// Monitor over the local host, reading through `sysinfo`.
    pub fn new(config: MonitorConfig) -> Self {
        let source = SysinfoSource::new(config.disk_path.clone());
        Self::with_source(config, Box::new(source))
    }

    pub fn with_source(config: MonitorConfig, source: Box<dyn MetricSource>) -> Self {
        let sampler = Sampler::new(source, config.cpu_sample_interval);
        let state = MonitorState {
            history: HistoryBuffer::new(config.history_capacity),
            alerts: AlertEngine::new(config.thresholds.clone(), config.event_capacity),
            last_check: None,
        };
        info!(
            history = config.history_capacity,
            events = config.event_capacity,
            "Monitor initialized"
        );
        Self {
            config,
            sampler: Mutex::new(sampler),
            state: RwLock::new(state),
            monitoring: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn start(&self) {
        self.monitoring.store(true, Ordering::SeqCst);
        info!("Monitor started");
    }

    pub fn stop(&self) {
        self.monitoring.store(false, Ordering::SeqCst);
        info!("Monitor stopped");
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    /// Takes one sample, records it and evaluates alerts. Blocks for the CPU
    /// sampling window. Never fails; a failed read yields a zero snapshot that
    /// is recorded and evaluated like any other, while the sampler keeps its
    /// delta baseline.
    pub fn collect(&self) -> MetricSnapshot {
        let mut sampler = self.lock_sampler();
        let capture = sampler.collect();
        let fresh = capture.is_fresh();
        let snapshot = capture.into_snapshot();

        let mut state = self.write_state();
        state.history.push(snapshot.clone());
        let evaluation = state.alerts.evaluate(&snapshot);
        state.last_check = Some(snapshot.timestamp_ms);
        debug!(
            cpu = snapshot.cpu.usage_pct,
            memory = snapshot.memory.usage_pct,
            disk = snapshot.disk.usage_pct,
            new_alerts = evaluation.new_events.len(),
            active_alerts = evaluation.active.len(),
            fresh,
            "Snapshot recorded"
        );
        snapshot
    }

    /// Latest recorded snapshot, or a zero snapshot before the first collection.
    pub fn get_metrics(&self) -> MetricSnapshot {
        self.read_state()
            .history
            .latest()
            .cloned()
            .unwrap_or_else(MetricSnapshot::zeroed)
    }

    pub fn get_system_status(&self) -> SystemStatus {
        let state = self.read_state();
        let Some(latest) = state.history.latest() else {
            return SystemStatus::empty();
        };
        let active = state.alerts.active();
        SystemStatus {
            timestamp: now_rfc3339(),
            metrics: latest.clone(),
            alerts: active.iter().copied().collect(),
            status: StatusLabel::from_active(active),
            trends: self.trends_of(&state),
            events: state.alerts.events().recent(self.config.recent_events),
        }
    }

    pub fn trends(&self) -> Trends {
        self.trends_of(&self.read_state())
    }

    pub fn active_alerts(&self) -> Vec<AlertKey> {
        self.read_state().alerts.active().iter().copied().collect()
    }

    /// Oldest first. `None` returns everything retained.
    pub fn history(&self, limit: Option<usize>) -> Vec<MetricSnapshot> {
        let state = self.read_state();
        match limit {
            Some(n) => state.history.recent(n),
            None => state.history.all(),
        }
    }

    /// Oldest first. `None` returns everything retained.
    pub fn events(&self, limit: Option<usize>) -> Vec<AlertEvent> {
        let state = self.read_state();
        let events = state.alerts.events();
        match limit {
            Some(n) => events.recent(n),
            None => events.all(),
        }
    }

    pub fn monitoring_status(&self) -> MonitoringStatus {
        let state = self.read_state();
        MonitoringStatus {
            is_monitoring: self.is_monitoring(),
            last_check: state.last_check,
            active_alerts: state.alerts.active().len(),
            metrics_collected: state.history.len(),
            events_logged: state.alerts.events().len(),
        }
    }

    fn trends_of(&self, state: &MonitorState) -> Trends {
        Trends::from_window(&state.history.recent(self.config.trend_window))
    }

    fn lock_sampler(&self) -> MutexGuard<'_, Sampler> {
        match self.sampler.lock() {
            Ok(g) => g,
            // Continue with the inner value even if poisoned.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, MonitorState> {
        match self.state.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, MonitorState> {
        match self.state.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
