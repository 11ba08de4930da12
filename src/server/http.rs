//! HTTP API
//!
//! Read-only endpoints over the reading store. Raw distances are converted
//! to liters here and rounded to one decimal for display; the store itself
//! never sees volumes.

use crate::common::utils::round1;
use crate::common::{unix_epoch_now, Config, Error, Result};
use crate::store::{Order, Period, Reading, ReadingStore};
use crate::tank::TankGeometry;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: ReadingStore,
    pub config: Arc<Config>,
}

/// Creates the HTTP router with all public endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dashboard page
        .route("/", get(index))
        // Health check
        .route("/health", get(health))
        // Latest reading ("/api/current" kept as a compatibility alias)
        .route("/api/last", get(api_last))
        .route("/api/current", get(api_last))
        // Ranked readings within a time window
        .route("/api/extremes", get(api_extremes))
        // Everything the dashboard page needs in one call
        .route("/api/dashboard", get(api_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Handlers ===

async fn health(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match run_query(move || store.last()).await {
        Ok(last) => Json(json!({
            "status": "ok",
            "mode": state.config.mode,
            "db_path": state.config.db_path.display().to_string(),
            "collect_interval_seconds": state.config.collect.interval_seconds,
            "has_data": last.is_some(),
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn api_last(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match run_query(move || store.last()).await {
        Ok(Some(reading)) => {
            let mut body = reading_fields(&reading, &state.config.tank, true);
            body["has_data"] = json!(true);
            body["age_seconds"] = json!((unix_epoch_now() - reading.fetched_at_epoch) as i64);
            Json(body).into_response()
        }
        Ok(None) => Json(json!({ "has_data": false })).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct ExtremesParams {
    #[serde(default = "default_period")]
    period: Period,
    #[serde(default = "default_order")]
    order: Order,
    #[serde(default = "default_n")]
    n: u32,
}

fn default_period() -> Period {
    Period::Day
}

fn default_order() -> Order {
    Order::Max
}

fn default_n() -> u32 {
    5
}

async fn api_extremes(
    State(state): State<AppState>,
    Query(params): Query<ExtremesParams>,
) -> Response {
    if let Err(resp) = check_limit(params.n) {
        return resp;
    }
    let store = state.store.clone();
    let (period, order, n) = (params.period, params.order, params.n);
    match run_query(move || store.extremes(period, n, order)).await {
        Ok(readings) => {
            let items: Vec<Value> = readings
                .iter()
                .map(|r| reading_fields(r, &state.config.tank, true))
                .collect();
            Json(json!({
                "period": period,
                "order": order,
                "count": items.len(),
                "items": items,
            }))
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct DashboardParams {
    #[serde(default = "default_n")]
    n: u32,
}

async fn api_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Response {
    if let Err(resp) = check_limit(params.n) {
        return resp;
    }
    let store = state.store.clone();
    let n = params.n;
    let queried = run_query(move || {
        let last = store.last()?;
        let mut extremes = Vec::with_capacity(Period::ALL.len());
        for period in Period::ALL {
            let max = store.extremes(period, n, Order::Max)?;
            let min = store.extremes(period, n, Order::Min)?;
            extremes.push((period, max, min));
        }
        Ok((last, extremes))
    })
    .await;

    let (last, extremes) = match queried {
        Ok(data) => data,
        Err(e) => return error_response(e),
    };

    let tank = &state.config.tank;
    let mut windows = serde_json::Map::new();
    for (period, max, min) in extremes {
        let max_items: Vec<Value> = max.iter().map(|r| reading_fields(r, tank, false)).collect();
        let min_items: Vec<Value> = min.iter().map(|r| reading_fields(r, tank, false)).collect();
        windows.insert(
            period.as_str().to_string(),
            json!({ "max": max_items, "min": min_items }),
        );
    }

    let last_value = last.map(|reading| {
        let mut body = reading_fields(&reading, tank, true);
        body["age_seconds"] = json!((unix_epoch_now() - reading.fetched_at_epoch) as i64);
        body
    });

    Json(json!({
        "tank": {
            "total_liters": tank.total_volume_liters,
            "diameter_cm": tank.diameter_cm,
            "length_cm": tank.length_cm,
            "full_air_gap_cm": tank.full_air_gap_cm,
        },
        "mode": state.config.mode,
        "has_data": last_value.is_some(),
        "last": last_value,
        "extremes": windows,
    }))
    .into_response()
}

async fn index() -> Html<String> {
    let stamp = chrono::Local::now().format("%d.%m.%Y %Hh%M").to_string();
    Html(
        INDEX_HTML
            .replace("{{version}}", crate::VERSION)
            .replace("{{stamp}}", &stamp),
    )
}

// === Helpers ===

/// Runs a store operation on the blocking pool
async fn run_query<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("store task failed: {e}")))?
}

/// Rejects item counts outside the supported window
fn check_limit(n: u32) -> std::result::Result<(), Response> {
    if (1..=50).contains(&n) {
        Ok(())
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "n must be between 1 and 50" })),
        )
            .into_response())
    }
}

/// Reading plus derived volume figures, rounded for display
fn reading_fields(reading: &Reading, tank: &TankGeometry, with_ip: bool) -> Value {
    let volume = tank.volume_from_distance(reading.distance_cm as f64);
    let mut fields = json!({
        "distance_cm": reading.distance_cm,
        "sensor_timestamp": reading.sensor_timestamp,
        "fetched_at_epoch": reading.fetched_at_epoch,
        "volume_liters": round1(volume),
        "fill_percent": tank.fill_percent(volume).map(round1),
    });
    if with_ip {
        fields["sensor_ip"] = json!(reading.sensor_ip);
    }
    fields
}

fn error_response(err: Error) -> Response {
    (
        err.to_http_status(),
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>tankd</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 720px; padding: 0 1rem; background: #11151a; color: #e6edf3; }
  h1 { font-size: 1.4rem; }
  h2 { font-size: 1.1rem; margin-top: 0; }
  .card { background: #1d242c; border-radius: 8px; padding: 1rem; margin: 1rem 0; }
  .bar { height: 28px; background: #30363d; border-radius: 6px; overflow: hidden; }
  .bar > div { height: 100%; background: #2f81f7; width: 0; transition: width .6s; }
  table { border-collapse: collapse; width: 100%; margin-top: .5rem; }
  td, th { text-align: left; padding: .25rem .5rem; border-bottom: 1px solid #30363d; }
  .muted { color: #8b949e; font-size: .85rem; }
</style>
</head>
<body>
<h1>Tank level</h1>
<div class="card">
  <div class="bar"><div id="fill"></div></div>
  <p><span id="volume">&ndash;</span> L (<span id="percent">&ndash;</span>%)</p>
  <p class="muted" id="meta">loading&hellip;</p>
</div>
<div class="card">
  <h2>Extremes</h2>
  <table id="extremes"><tr><th>Period</th><th>Fullest</th><th>Emptiest</th></tr></table>
</div>
<p class="muted">tankd {{version}} &middot; rendered {{stamp}}</p>
<script>
async function refresh() {
  const r = await fetch('/api/dashboard');
  const d = await r.json();
  const meta = document.getElementById('meta');
  if (!d.has_data || !d.last) {
    meta.textContent = 'no readings yet';
    return;
  }
  const last = d.last;
  document.getElementById('volume').textContent = last.volume_liters;
  document.getElementById('percent').textContent = last.fill_percent ?? '?';
  document.getElementById('fill').style.width = (last.fill_percent ?? 0) + '%';
  meta.textContent = 'distance ' + last.distance_cm + ' cm / sensor ' + last.sensor_timestamp +
    ' / age ' + last.age_seconds + ' s';
  const table = document.getElementById('extremes');
  while (table.rows.length > 1) table.deleteRow(1);
  for (const [period, sides] of Object.entries(d.extremes)) {
    const row = table.insertRow();
    row.insertCell().textContent = period;
    row.insertCell().textContent = sides.min[0] ? sides.min[0].volume_liters + ' L' : '-';
    row.insertCell().textContent = sides.max[0] ? sides.max[0].volume_liters + ' L' : '-';
  }
}
refresh();
setInterval(refresh, 30000);
</script>
</body>
</html>
"#;
