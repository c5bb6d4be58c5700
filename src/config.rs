use crate::alerts::Thresholds;
use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Values injected into a `Monitor` at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    pub thresholds: Thresholds,
    /// Snapshots retained for history and trends.
    pub history_capacity: usize,
    /// Alert events retained.
    pub event_capacity: usize,
    /// Snapshots used for trend slopes.
    pub trend_window: usize,
    /// Alert events included in a status report.
    pub recent_events: usize,
    /// Blocking window for the CPU rate measurement.
    pub cpu_sample_interval: Duration,
    /// Path whose containing mount is reported as the disk.
    pub disk_path: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            history_capacity: 100,
            event_capacity: 50,
            trend_window: 10,
            recent_events: 50,
            cpu_sample_interval: Duration::from_millis(100),
            disk_path: PathBuf::from("/"),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("history"));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("event"));
        }
        if self.trend_window == 0 {
            return Err(ConfigError::ZeroCapacity("trend window"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum Mode {
    Console,
    Web,
    Both,
}

#[derive(Clone, Debug, Parser)]
#[command(name = "host_monitor", about = "Local host metrics sampler with threshold alerts")]
pub struct Config {
    /// Sampling interval in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub interval_ms: u64,

    /// Output mode (console/web/both)
    #[arg(long, value_enum, default_value_t = Mode::Web)]
    pub mode: Mode,

    /// Bind address for HTTP server
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// HTTP server port
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// History depth (number of snapshots kept in memory)
    #[arg(long, default_value_t = 100)]
    pub history: usize,

    /// Number of alert events kept in memory
    #[arg(long, default_value_t = 50)]
    pub events: usize,

    /// Path whose mount is monitored for disk usage
    #[arg(long, default_value = "/")]
    pub disk_path: PathBuf,

    /// CPU measurement window in milliseconds
    #[arg(long, default_value_t = 100)]
    pub cpu_sample_ms: u64,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value_t = 70.0)]
    pub cpu_warning: f64,

    #[arg(long, default_value_t = 90.0)]
    pub cpu_critical: f64,

    #[arg(long, default_value_t = 80.0)]
    pub memory_warning: f64,

    #[arg(long, default_value_t = 90.0)]
    pub memory_critical: f64,

    #[arg(long, default_value_t = 80.0)]
    pub disk_warning: f64,

    #[arg(long, default_value_t = 90.0)]
    pub disk_critical: f64,
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn web_enabled(&self) -> bool {
        matches!(self.mode, Mode::Web | Mode::Both)
    }

    pub fn console_enabled(&self) -> bool {
        matches!(self.mode, Mode::Console | Mode::Both)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            cpu_warning: self.cpu_warning,
            cpu_critical: self.cpu_critical,
            memory_warning: self.memory_warning,
            memory_critical: self.memory_critical,
            disk_warning: self.disk_warning,
            disk_critical: self.disk_critical,
        }
    }

    pub fn monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        let config = MonitorConfig {
            thresholds: self.thresholds(),
            history_capacity: self.history,
            event_capacity: self.events,
            recent_events: self.events,
            cpu_sample_interval: Duration::from_millis(self.cpu_sample_ms),
            disk_path: self.disk_path.clone(),
            ..MonitorConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_monitor_defaults() {
        let config = Config::parse_from(["host_monitor"]);
        let monitor = config.monitor_config().unwrap();
        assert_eq!(monitor, MonitorConfig::default());
        assert_eq!(config.interval(), Duration::from_secs(2));
        assert!(config.web_enabled());
        assert!(!config.console_enabled());
    }

    #[test]
    fn threshold_flags_override_defaults() {
        let config = Config::parse_from(["host_monitor", "--cpu-warning", "50", "--mode", "both"]);
        let monitor = config.monitor_config().unwrap();
        assert_eq!(monitor.thresholds.cpu_warning, 50.0);
        assert_eq!(monitor.thresholds.cpu_critical, 90.0);
        assert!(config.console_enabled());
    }

    #[test]
    fn rejects_invalid_values() {
        let inverted = Config::parse_from(["host_monitor", "--memory-warning", "95"]);
        assert!(matches!(
            inverted.monitor_config(),
            Err(ConfigError::InvertedThresholds { .. })
        ));
        let no_history = Config::parse_from(["host_monitor", "--history", "0"]);
        assert_eq!(
            no_history.monitor_config(),
            Err(ConfigError::ZeroCapacity("history"))
        );
    }
}
