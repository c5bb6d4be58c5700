use crate::monitor::Monitor;
use crate::status::SystemStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub struct AggregatorConfig {
    pub interval: Duration,
}

impl AggregatorConfig {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

/// Drives `Monitor::collect` on a fixed interval and publishes each resulting
/// status to stream subscribers.
pub struct Aggregator {
    config: AggregatorConfig,
    monitor: Arc<Monitor>,
    status_tx: broadcast::Sender<SystemStatus>,
}

impl Aggregator {
    pub fn new(
        config: AggregatorConfig,
        monitor: Arc<Monitor>,
        status_tx: broadcast::Sender<SystemStatus>,
    ) -> Self {
        Self {
            config,
            monitor,
            status_tx,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        self.monitor.start();
        info!(
            "Collector started with interval {:?}",
            self.config.interval
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            // interval() ticks immediately on the first await, which gives us a fast first sample.
            tokio::select! {
                _ = cancel.cancelled() => {
                    break;
                }
                _ = ticker.tick() => {}
            }

            // collect() blocks for the CPU sampling window.
            let monitor = self.monitor.clone();
            let status = match tokio::task::spawn_blocking(move || {
                monitor.collect();
                monitor.get_system_status()
            })
            .await
            {
                Ok(status) => status,
                Err(e) => {
                    error!("Collection task failed: {}", e);
                    continue;
                }
            };

            if self.status_tx.send(status).is_err() {
                // No stream subscribers right now; the monitor stays the source of truth.
                debug!("No stream subscribers for status update");
            }
        }

        self.monitor.stop();
        info!("Collector stopped");
    }
}
