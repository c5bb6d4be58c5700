use clap::Parser;
use host_monitor::aggregator::{Aggregator, AggregatorConfig};
use host_monitor::api::{router, AppState};
use host_monitor::config::Config;
use host_monitor::console;
use host_monitor::monitor::Monitor;
use host_monitor::runtime;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Config::parse();
    let sink = runtime::init_tracing(args.log_file.as_deref());
    info!(?sink, "Logging initialized");

    let monitor_config = match args.monitor_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };
    info!(
        "Starting host monitor: interval={}ms, mode={:?}, history={}, disk_path={}",
        args.interval_ms,
        args.mode,
        monitor_config.history_capacity,
        monitor_config.disk_path.display()
    );

    let monitor = Arc::new(Monitor::new(monitor_config));
    let cancel = CancellationToken::new();
    let (status_tx, _status_rx) = tokio::sync::broadcast::channel(256);

    let agg = Aggregator::new(
        AggregatorConfig::new(args.interval()),
        monitor.clone(),
        status_tx.clone(),
    );
    let agg_cancel = cancel.clone();
    let agg_handle = tokio::spawn(async move { agg.run(agg_cancel).await });

    let console_handle = if args.console_enabled() {
        let console_cancel = cancel.clone();
        let console_monitor = monitor.clone();
        let interval = args.interval();
        Some(tokio::spawn(async move {
            console::run_console(console_monitor, interval, console_cancel).await;
        }))
    } else {
        None
    };

    let web_handle = if args.web_enabled() {
        let app = router(AppState {
            monitor: monitor.clone(),
            status_tx: status_tx.clone(),
            shutdown: cancel.clone(),
        });
        let addr = SocketAddr::from((args.bind, args.port));
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                info!(
                    "HTTP server listening on http://{}",
                    listener.local_addr().unwrap_or(addr)
                );
                let shutdown = cancel.clone();
                Some(tokio::spawn(async move {
                    let res = axum::serve(listener, app)
                        .with_graceful_shutdown(async move { shutdown.cancelled().await })
                        .await;
                    if let Err(e) = res {
                        error!("Server error: {}", e);
                    }
                }))
            }
            Err(e) => {
                // Keep sampling even without the dashboard.
                error!("Failed to bind {}: {}", addr, e);
                None
            }
        }
    } else {
        None
    };

    runtime::shutdown_signal().await;
    cancel.cancel();

    if let Some(h) = web_handle {
        let _ = h.await;
    }
    if let Some(h) = console_handle {
        let _ = h.await;
    }
    let _ = agg_handle.await;
    info!("Host monitor exited");
}
