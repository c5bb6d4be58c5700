use std::path::PathBuf;
use thiserror::Error;

/// A failed OS metric query. Absorbed by the sampler; never returned from
/// the monitor's collect or read paths.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("platform is not supported by the metric source")]
    Unsupported,

    #[error("memory totals unavailable")]
    MemoryUnavailable,

    #[error("no mounted disk contains {0}")]
    DiskNotFound(PathBuf),

    #[error("disk at {0} reports zero capacity")]
    DiskUnavailable(PathBuf),

    #[error("I/O error reading metrics: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("threshold {key} must be within 0..=100, got {value}")]
    InvalidThreshold { key: String, value: f64 },

    #[error("{component} warning threshold {warning} is above critical threshold {critical}")]
    InvertedThresholds {
        component: String,
        warning: f64,
        critical: f64,
    },

    #[error("{0} capacity must be greater than zero")]
    ZeroCapacity(&'static str),
}
