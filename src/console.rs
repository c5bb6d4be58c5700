use crate::alerts::{Component, Severity, Thresholds};
use crate::monitor::Monitor;
use crate::status::{StatusLabel, SystemStatus};
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::ExecutableCommand;
use std::io::{stdout, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::error;

const EVENTS_SHOWN: usize = 5;

pub async fn run_console(monitor: Arc<Monitor>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break;
            }
            _ = ticker.tick() => {
                let status = monitor.get_system_status();
                if let Err(e) = render_once(&status, &monitor.config().thresholds) {
                    error!("Console render error: {}", e);
                }
            }
        }
    }
}

fn render_once(status: &SystemStatus, thresholds: &Thresholds) -> std::io::Result<()> {
    let mut out = stdout();
    out.execute(MoveTo(0, 0))?;
    out.execute(Clear(ClearType::All))?;

    writeln!(out, "Host Monitor (console)   status: {}", color_label(status.status))?;
    writeln!(out, "Press Ctrl+C to exit.")?;
    writeln!(out)?;

    if status.status == StatusLabel::Unknown {
        writeln!(out, "Waiting for first sample...")?;
        out.flush()?;
        return Ok(());
    }

    let snap = &status.metrics;
    writeln!(
        out,
        "CPU:    {}   user {:.1}%  system {:.1}%   trend {:+.2}/sample",
        color_pct(snap.cpu.usage_pct, Component::Cpu, thresholds),
        snap.cpu.user_pct,
        snap.cpu.system_pct,
        status.trends.cpu_usage
    )?;
    writeln!(
        out,
        "Memory: {}   {} used / {} total   delta {:+.2}   trend {:+.2}/sample",
        color_pct(snap.memory.usage_pct, Component::Memory, thresholds),
        format_bytes(snap.memory.used_bytes),
        format_bytes(snap.memory.total_bytes),
        snap.deltas.memory_usage_pct,
        status.trends.memory_usage
    )?;
    writeln!(
        out,
        "Disk:   {}   {} used / {} total   delta {:+.2}   trend {:+.2}/sample",
        color_pct(snap.disk.usage_pct, Component::Disk, thresholds),
        format_bytes(snap.disk.used_bytes),
        format_bytes(snap.disk.total_bytes),
        snap.deltas.disk_usage_pct,
        status.trends.disk_usage
    )?;

    writeln!(out)?;
    writeln!(out, "Recent alerts:")?;
    if status.events.is_empty() {
        writeln!(out, "  none")?;
    }
    for event in status.events.iter().rev().take(EVENTS_SHOWN) {
        let line = format!("  {}", event.message);
        let colored = match event.severity {
            Severity::Critical => line.with(Color::Red),
            Severity::Warning => line.with(Color::Yellow),
        };
        writeln!(out, "{}", colored)?;
    }

    out.flush()?;
    Ok(())
}

fn color_label(label: StatusLabel) -> String {
    let s = label.to_string();
    match label {
        StatusLabel::Critical => s.with(Color::Red).to_string(),
        StatusLabel::Warning => s.with(Color::Yellow).to_string(),
        StatusLabel::Healthy => s.with(Color::Green).to_string(),
        StatusLabel::Unknown => s.with(Color::DarkGrey).to_string(),
    }
}

fn color_pct(value: f64, component: Component, thresholds: &Thresholds) -> String {
    let s = format!("{value:.1}%");
    match thresholds.severity_for(component, value) {
        Some(Severity::Critical) => s.with(Color::Red).to_string(),
        Some(Severity::Warning) => s.with(Color::Yellow).to_string(),
        None => s.with(Color::Green).to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    const TB: f64 = GB * 1024.0;

    let b = bytes as f64;
    if b >= TB {
        format!("{:.2} TiB", b / TB)
    } else if b >= GB {
        format!("{:.2} GiB", b / GB)
    } else if b >= MB {
        format!("{:.2} MiB", b / MB)
    } else if b >= KB {
        format!("{:.2} KiB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes_with_binary_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }
}
