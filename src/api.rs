use crate::monitor::Monitor;
use crate::status::SystemStatus;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
    pub status_tx: broadcast::Sender<SystemStatus>,
    pub shutdown: CancellationToken,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Read-only routes; nothing here triggers a collection.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/metrics", get(get_metrics))
        .route("/api/status", get(get_status))
        .route("/api/history", get(get_history))
        .route("/api/events", get(get_events))
        .route("/api/monitoring", get(get_monitoring))
        .route("/api/stream", get(stream))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}

async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.monitor.get_metrics())).into_response()
}

async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.monitor.get_system_status())).into_response()
}

async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> impl IntoResponse {
    (StatusCode::OK, Json(state.monitor.history(query.limit))).into_response()
}

async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> impl IntoResponse {
    (StatusCode::OK, Json(state.monitor.events(query.limit))).into_response()
}

async fn get_monitoring(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.monitor.monitoring_status())).into_response()
}

async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.status_tx.subscribe();
    let shutdown = state.shutdown.clone();
    let stream = BroadcastStream::new(rx)
        .take_until(async move { shutdown.cancelled().await })
        .map(|msg| match msg {
            Ok(status) => match serde_json::to_string(&status) {
                Ok(json) => Ok(Event::default().data(json)),
                Err(e) => Ok(Event::default()
                    .event("error")
                    .data(format!("serialize_error: {e}"))),
            },
            Err(e) => Ok(Event::default()
                .event("error")
                .data(format!("stream_error: {e}"))),
        });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(10))
            .text("keep-alive"),
    )
}

async fn index() -> impl IntoResponse {
    Html(DASHBOARD)
}

const DASHBOARD: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8"/>
  <title>Host Monitor</title>
  <style>
    :root {
      --bg: #0b0f19;
      --panel: #0f1626;
      --border: #2a3550;
      --text: #e5e7eb;
      --muted: #9ca3af;
    }
    body { background: var(--bg); color: var(--text); font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Arial; margin: 24px; }
    a { color: #93c5fd; text-decoration: none; }
    .panel { background: var(--panel); border: 1px solid var(--border); border-radius: 12px; padding: 12px; }
    .row { display: flex; gap: 16px; flex-wrap: wrap; margin-bottom: 16px; }
    .card { min-width: 180px; }
    .value { font-size: 28px; font-family: ui-monospace, Menlo, Consolas, monospace; }
    .muted { color: var(--muted); font-size: 12px; }
    .healthy { color: #22c55e; } .warning { color: #eab308; } .critical { color: #ef4444; } .unknown { color: var(--muted); }
    canvas { background: var(--panel); border: 1px solid var(--border); border-radius: 10px; }
    ul { margin: 0; padding-left: 18px; font-family: ui-monospace, Menlo, Consolas, monospace; font-size: 12px; }
  </style>
</head>
<body>
  <h1>Host Monitor <span id="label" class="unknown">unknown</span></h1>
  <div class="row">
    <div class="panel card"><div class="muted">CPU</div><div class="value" id="cpu">-</div><div class="muted" id="cpu-trend"></div></div>
    <div class="panel card"><div class="muted">Memory</div><div class="value" id="mem">-</div><div class="muted" id="mem-trend"></div></div>
    <div class="panel card"><div class="muted">Disk</div><div class="value" id="disk">-</div><div class="muted" id="disk-trend"></div></div>
  </div>
  <div class="row">
    <canvas id="chart" width="720" height="200"></canvas>
    <div class="panel" style="min-width:320px;"><h3 style="margin-top:0">Alert events</h3><ul id="events"></ul></div>
  </div>
  <div class="muted">
    <a href="/api/metrics">/api/metrics</a> | <a href="/api/status">/api/status</a> |
    <a href="/api/history">/api/history</a> | <a href="/api/events">/api/events</a> |
    <a href="/api/monitoring">/api/monitoring</a>
  </div>
  <script>
    const series = { cpu: '#60a5fa', memory: '#a78bfa', disk: '#f59e0b' };
    const fmt = v => v.toFixed(1) + '%';
    const slope = v => (v >= 0 ? '+' : '') + v.toFixed(2) + ' pts/sample';

    function draw(history) {
      const c = document.getElementById('chart');
      const ctx = c.getContext('2d');
      ctx.clearRect(0, 0, c.width, c.height);
      if (history.length < 2) return;
      for (const [key, color] of Object.entries(series)) {
        ctx.strokeStyle = color;
        ctx.beginPath();
        history.forEach((s, i) => {
          const x = i / (history.length - 1) * (c.width - 10) + 5;
          const y = c.height - 5 - s[key].usage / 100 * (c.height - 10);
          i === 0 ? ctx.moveTo(x, y) : ctx.lineTo(x, y);
        });
        ctx.stroke();
      }
    }

    async function poll() {
      try {
        const status = await (await fetch('/api/status')).json();
        const label = document.getElementById('label');
        label.textContent = status.status;
        label.className = status.status;
        document.getElementById('cpu').textContent = fmt(status.metrics.cpu.usage);
        document.getElementById('mem').textContent = fmt(status.metrics.memory.usage);
        document.getElementById('disk').textContent = fmt(status.metrics.disk.usage);
        document.getElementById('cpu-trend').textContent = slope(status.trends.cpu_usage);
        document.getElementById('mem-trend').textContent = slope(status.trends.memory_usage);
        document.getElementById('disk-trend').textContent = slope(status.trends.disk_usage);
        const events = document.getElementById('events');
        events.innerHTML = '';
        status.events.slice().reverse().forEach(e => {
          const li = document.createElement('li');
          li.className = e.severity;
          li.textContent = new Date(e.timestamp).toLocaleTimeString() + ' ' + e.message;
          events.appendChild(li);
        });
        draw(await (await fetch('/api/history')).json());
      } catch (e) {
        console.error(e);
      }
    }

    poll();
    setInterval(poll, 2000);
  </script>
</body>
</html>"#;
