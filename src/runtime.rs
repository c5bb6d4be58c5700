use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Which log sink `init_tracing` ended up installing.
#[derive(Clone, Debug, PartialEq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
    /// Another global subscriber was already set; nothing was changed.
    AlreadyInstalled,
}

/// Installs the global `tracing` subscriber. Falls back to stderr when the log
/// file cannot be opened, and never fails startup.
pub fn init_tracing(log_file: Option<&Path>) -> LogSink {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut file_error = None;
    if let Some(path) = log_file {
        match open_log_file(path) {
            Ok(file) => {
                let installed = tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init()
                    .is_ok();
                if !installed {
                    return LogSink::AlreadyInstalled;
                }
                info!("Logging to {}", path.display());
                return LogSink::File(path.to_path_buf());
            }
            Err(e) => file_error = Some(e),
        }
    }

    if tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        return LogSink::AlreadyInstalled;
    }
    if let (Some(path), Some(e)) = (log_file, file_error) {
        warn!(
            "Cannot open log file {}: {}; logging to stderr",
            path.display(),
            e
        );
    }
    LogSink::Stderr
}

fn open_log_file(path: &Path) -> std::io::Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        // Without a signal handler, park until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parent_directories_for_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("monitor.log");
        let file = open_log_file(&path);
        assert!(file.is_ok());
        assert!(path.exists());
    }

    #[test]
    fn unwritable_log_path_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();
        assert!(open_log_file(&blocker.join("monitor.log")).is_err());
    }

    #[test]
    fn second_init_reports_already_installed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.log");
        let first = init_tracing(Some(&path));
        let second = init_tracing(None);
        assert!(matches!(first, LogSink::File(_) | LogSink::AlreadyInstalled));
        assert_eq!(second, LogSink::AlreadyInstalled);
    }
}
