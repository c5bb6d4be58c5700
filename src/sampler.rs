use crate::error::CollectError;
use crate::metrics::{
    now_timestamp_ms, percent_of, CpuMetrics, DiskMetrics, MemoryMetrics, MetricDeltas,
    MetricSnapshot,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::{Disks, System};
use tracing::{debug, error};

/// One raw read of the three resource groups, before deltas are attached.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reading {
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: DiskMetrics,
}

/// Where readings come from. `cpu_window` is how long the source may block
/// to measure an instantaneous CPU rate.
pub trait MetricSource: Send {
    fn read(&mut self, cpu_window: Duration) -> Result<Reading, CollectError>;
}

/// Reads the local host through `sysinfo`, plus `/proc/stat` for the
/// user/system split on Linux.
pub struct SysinfoSource {
    sys: System,
    disk_path: PathBuf,
}

impl SysinfoSource {
    pub fn new(disk_path: impl Into<PathBuf>) -> Self {
        Self {
            sys: System::new(),
            disk_path: disk_path.into(),
        }
    }

    fn read_cpu(&mut self, window: Duration) -> CpuMetrics {
        // sysinfo needs at least this long between refreshes for a usable rate.
        let window = window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        let before = read_cpu_times();
        self.sys.refresh_cpu_usage();
        std::thread::sleep(window);
        self.sys.refresh_cpu_usage();
        let after = read_cpu_times();

        let (user_pct, system_pct) = match (before, after) {
            (Some(before), Some(after)) => after.split_since(&before),
            _ => (0.0, 0.0),
        };
        CpuMetrics {
            usage_pct: clamp_pct(self.sys.global_cpu_usage() as f64),
            user_pct,
            system_pct,
        }
    }

    fn read_memory(&mut self) -> Result<MemoryMetrics, CollectError> {
        self.sys.refresh_memory();
        let total_bytes = self.sys.total_memory();
        if total_bytes == 0 {
            return Err(CollectError::MemoryUnavailable);
        }
        let available_bytes = self.sys.available_memory().min(total_bytes);
        let used_bytes = total_bytes - available_bytes;
        Ok(MemoryMetrics {
            usage_pct: clamp_pct(percent_of(used_bytes, total_bytes)),
            total_bytes,
            available_bytes,
            used_bytes,
        })
    }

    fn read_disk(&self) -> Result<DiskMetrics, CollectError> {
        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<MountUsage> = disks
            .list()
            .iter()
            .map(|d| MountUsage {
                mount_point: d.mount_point().to_path_buf(),
                total_bytes: d.total_space(),
                available_bytes: d.available_space(),
            })
            .collect();
        let mount = pick_mount(&mounts, &self.disk_path)
            .ok_or_else(|| CollectError::DiskNotFound(self.disk_path.clone()))?;
        if mount.total_bytes == 0 {
            return Err(CollectError::DiskUnavailable(mount.mount_point.clone()));
        }
        Ok(mount.to_metrics())
    }
}

impl MetricSource for SysinfoSource {
    fn read(&mut self, cpu_window: Duration) -> Result<Reading, CollectError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(CollectError::Unsupported);
        }
        let cpu = self.read_cpu(cpu_window);
        let memory = self.read_memory()?;
        let disk = self.read_disk()?;
        Ok(Reading { cpu, memory, disk })
    }
}

#[derive(Clone, Debug, PartialEq)]
struct MountUsage {
    mount_point: PathBuf,
    total_bytes: u64,
    available_bytes: u64,
}

impl MountUsage {
    fn to_metrics(&self) -> DiskMetrics {
        let free_bytes = self.available_bytes.min(self.total_bytes);
        let used_bytes = self.total_bytes - free_bytes;
        DiskMetrics {
            usage_pct: clamp_pct(percent_of(used_bytes, self.total_bytes)),
            total_bytes: self.total_bytes,
            used_bytes,
            free_bytes,
        }
    }
}

/// The mount whose mount point is the longest prefix of `path`.
fn pick_mount<'a>(mounts: &'a [MountUsage], path: &Path) -> Option<&'a MountUsage> {
    mounts
        .iter()
        .filter(|m| path.starts_with(&m.mount_point))
        .max_by_key(|m| m.mount_point.components().count())
}

/// Aggregate jiffies from the `cpu` line of `/proc/stat`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct CpuTimes {
    user: u64,
    system: u64,
    total: u64,
}

impl CpuTimes {
    /// (user %, system %) of the elapsed jiffies between `earlier` and `self`.
    fn split_since(&self, earlier: &CpuTimes) -> (f64, f64) {
        let total = self.total.saturating_sub(earlier.total);
        let user = self.user.saturating_sub(earlier.user);
        let system = self.system.saturating_sub(earlier.system);
        (
            clamp_pct(percent_of(user, total)),
            clamp_pct(percent_of(system, total)),
        )
    }
}

fn parse_proc_stat(content: &str) -> Option<CpuTimes> {
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    // user nice system idle iowait irq softirq steal; guest time is already in user.
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|v| v.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if fields.len() < 4 {
        return None;
    }
    let field = |i: usize| fields.get(i).copied().unwrap_or(0);
    Some(CpuTimes {
        user: field(0) + field(1),
        system: field(2) + field(5) + field(6),
        total: fields.iter().sum(),
    })
}

#[cfg(target_os = "linux")]
fn read_cpu_times() -> Option<CpuTimes> {
    match std::fs::read_to_string("/proc/stat") {
        Ok(content) => parse_proc_stat(&content),
        Err(e) => {
            debug!("Cannot read /proc/stat: {}", e);
            None
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn read_cpu_times() -> Option<CpuTimes> {
    debug!("User/system CPU split is only available on Linux");
    None
}

fn clamp_pct(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Result of one collection attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Capture {
    Fresh(MetricSnapshot),
    /// The source failed; the snapshot is zero-valued.
    Degraded(MetricSnapshot),
}

impl Capture {
    pub fn snapshot(&self) -> &MetricSnapshot {
        match self {
            Capture::Fresh(s) | Capture::Degraded(s) => s,
        }
    }

    pub fn into_snapshot(self) -> MetricSnapshot {
        match self {
            Capture::Fresh(s) | Capture::Degraded(s) => s,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Capture::Fresh(_))
    }
}

/// Turns source readings into snapshots and holds the baseline used for deltas.
pub struct Sampler {
    source: Box<dyn MetricSource>,
    cpu_window: Duration,
    baseline: Option<MetricSnapshot>,
}

impl Sampler {
    pub fn new(source: Box<dyn MetricSource>, cpu_window: Duration) -> Self {
        Self {
            source,
            cpu_window,
            baseline: None,
        }
    }

    /// Never fails: a source error is logged and yields a degraded zero snapshot
    /// that leaves the baseline untouched.
    pub fn collect(&mut self) -> Capture {
        match self.source.read(self.cpu_window) {
            Ok(reading) => {
                let snapshot = MetricSnapshot {
                    timestamp_ms: now_timestamp_ms(),
                    deltas: deltas_between(self.baseline.as_ref(), &reading),
                    cpu: reading.cpu,
                    memory: reading.memory,
                    disk: reading.disk,
                };
                self.baseline = Some(snapshot.clone());
                Capture::Fresh(snapshot)
            }
            Err(e) => {
                error!("Metric collection failed: {}", e);
                Capture::Degraded(MetricSnapshot::zeroed())
            }
        }
    }

    pub fn baseline(&self) -> Option<&MetricSnapshot> {
        self.baseline.as_ref()
    }
}

/// Zero when there is no previous snapshot.
pub fn deltas_between(previous: Option<&MetricSnapshot>, current: &Reading) -> MetricDeltas {
    match previous {
        Some(prev) => MetricDeltas {
            memory_usage_pct: current.memory.usage_pct - prev.memory.usage_pct,
            disk_usage_pct: current.disk.usage_pct - prev.disk.usage_pct,
        },
        None => MetricDeltas::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<Result<Reading, CollectError>>);

    impl MetricSource for Scripted {
        fn read(&mut self, _cpu_window: Duration) -> Result<Reading, CollectError> {
            self.0.pop_front().unwrap_or(Err(CollectError::Unsupported))
        }
    }

    fn reading(memory: f64, disk: f64) -> Reading {
        let mut r = Reading::default();
        r.memory.usage_pct = memory;
        r.disk.usage_pct = disk;
        r
    }

    fn sampler(script: Vec<Result<Reading, CollectError>>) -> Sampler {
        Sampler::new(Box::new(Scripted(script.into())), Duration::ZERO)
    }

    #[test]
    fn first_capture_has_zero_deltas() {
        let mut s = sampler(vec![Ok(reading(40.0, 60.0))]);
        let capture = s.collect();
        assert!(capture.is_fresh());
        assert_eq!(capture.snapshot().deltas, MetricDeltas::default());
        assert_eq!(s.baseline().unwrap().memory.usage_pct, 40.0);
    }

    #[test]
    fn deltas_follow_previous_capture() {
        let mut s = sampler(vec![Ok(reading(40.0, 60.0)), Ok(reading(45.5, 59.0))]);
        s.collect();
        let second = s.collect().into_snapshot();
        assert!((second.deltas.memory_usage_pct - 5.5).abs() < 1e-9);
        assert!((second.deltas.disk_usage_pct + 1.0).abs() < 1e-9);
    }

    #[test]
    fn failure_yields_zero_snapshot_and_keeps_baseline() {
        let mut s = sampler(vec![
            Ok(reading(40.0, 60.0)),
            Err(CollectError::MemoryUnavailable),
            Ok(reading(50.0, 60.0)),
        ]);
        s.collect();
        let failed = s.collect();
        assert!(!failed.is_fresh());
        assert_eq!(failed.snapshot().memory, MemoryMetrics::default());
        assert_eq!(s.baseline().unwrap().memory.usage_pct, 40.0);

        let next = s.collect().into_snapshot();
        assert!((next.deltas.memory_usage_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn parses_proc_stat_cpu_line() {
        let content = "cpu  100 20 30 800 10 5 5 0 0 0\ncpu0 50 10 15 400 5 2 3 0 0 0\n";
        let times = parse_proc_stat(content).unwrap();
        assert_eq!(
            times,
            CpuTimes {
                user: 120,
                system: 40,
                total: 970
            }
        );
        assert!(parse_proc_stat("intr 1 2 3").is_none());
    }

    #[test]
    fn splits_cpu_time_between_reads() {
        let before = CpuTimes {
            user: 100,
            system: 50,
            total: 1000,
        };
        let after = CpuTimes {
            user: 130,
            system: 60,
            total: 1100,
        };
        let (user, system) = after.split_since(&before);
        assert!((user - 30.0).abs() < 1e-9);
        assert!((system - 10.0).abs() < 1e-9);
    }

    #[test]
    fn picks_longest_matching_mount() {
        let mounts = vec![
            MountUsage {
                mount_point: PathBuf::from("/"),
                total_bytes: 100,
                available_bytes: 40,
            },
            MountUsage {
                mount_point: PathBuf::from("/home"),
                total_bytes: 200,
                available_bytes: 150,
            },
        ];
        let picked = pick_mount(&mounts, Path::new("/home/user")).unwrap();
        assert_eq!(picked.mount_point, PathBuf::from("/home"));
        let root = pick_mount(&mounts, Path::new("/")).unwrap();
        let metrics = root.to_metrics();
        assert_eq!(metrics.used_bytes, 60);
        assert_eq!(metrics.free_bytes, 40);
        assert!((metrics.usage_pct - 60.0).abs() < 1e-9);
        assert!(pick_mount(&mounts[1..], Path::new("/var")).is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn host_reading_is_within_bounds() {
        let reading = SysinfoSource::new("/")
            .read(Duration::from_millis(50))
            .unwrap();
        for pct in [
            reading.cpu.usage_pct,
            reading.cpu.user_pct,
            reading.cpu.system_pct,
            reading.memory.usage_pct,
            reading.disk.usage_pct,
        ] {
            assert!((0.0..=100.0).contains(&pct), "{pct}");
        }
        assert_eq!(
            reading.memory.used_bytes + reading.memory.available_bytes,
            reading.memory.total_bytes
        );
        assert_eq!(
            reading.disk.used_bytes + reading.disk.free_bytes,
            reading.disk.total_bytes
        );
    }
}
