pub mod aggregator;
pub mod alerts;
pub mod api;
pub mod config;
pub mod console;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod runtime;
pub mod sampler;
pub mod status;
pub mod storage;
pub mod trends;
