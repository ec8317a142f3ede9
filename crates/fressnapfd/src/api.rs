//! Read-only HTTP API exposing current sensor values.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::TrackerConfig;
use crate::sensor;
use crate::state::SharedState;

/// Response for the /v1/ping endpoint
#[derive(Serialize)]
struct PingResponse {
    status: String,
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
}

/// One entry of the /v1/trackers listing
#[derive(Serialize)]
struct TrackerSummary {
    name: String,
    serial_number: u64,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

/// One sensor of a /v1/trackers/:name/sensors response
#[derive(Serialize)]
struct SensorReading {
    key: &'static str,
    name: &'static str,
    unit: &'static str,
    device_class: sensor::SensorDeviceClass,
    available: bool,
    value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<Value>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    version: &'static str,
    trackers: Arc<HashMap<String, TrackerConfig>>,
    state: SharedState,
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Handling /v1/info request");

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
        }),
    )
}

/// Handler for GET /v1/trackers
#[tracing::instrument(skip(state))]
async fn list_trackers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.state.snapshot();

    let mut trackers: Vec<TrackerSummary> = state
        .trackers
        .iter()
        .map(|(name, config)| {
            let tracker = snapshot.trackers.get(name);
            TrackerSummary {
                name: name.clone(),
                serial_number: config.serial_number,
                available: sensor::available(
                    tracker.and_then(|t| t.record.as_deref()),
                ),
                last_error: tracker.and_then(|t| t.last_error.clone()),
            }
        })
        .collect();
    trackers.sort_by(|a, b| a.name.cmp(&b.name));

    (StatusCode::OK, Json(trackers))
}

/// Handler for GET /v1/trackers/:name/sensors
#[tracing::instrument(skip(state))]
async fn tracker_sensors(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SensorReading>>, StatusCode> {
    let config = state.trackers.get(&name).ok_or(StatusCode::NOT_FOUND)?;

    let snapshot = state.state.snapshot();
    let record = snapshot
        .trackers
        .get(&name)
        .and_then(|t| t.record.as_deref());
    let available = sensor::available(record);

    let readings = sensor::SENSOR_DESCRIPTIONS
        .iter()
        .map(|description| SensorReading {
            key: description.key,
            name: description.name,
            unit: description.unit,
            device_class: description.device_class,
            available,
            value: record.and_then(|r| description.value(r)),
            attributes: record
                .and_then(|r| description.attributes(r, config.weight_history_depth)),
        })
        .collect();

    Ok(Json(readings))
}

/// Create the API router with all endpoints
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/v1/trackers", get(list_trackers))
        .route("/v1/trackers/:name/sensors", get(tracker_sensors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server.
///
/// Binds to the specified address and serves until the provided shutdown
/// signal is triggered.
pub async fn serve(
    listen: String,
    port: u16,
    trackers: Arc<HashMap<String, TrackerConfig>>,
    state: SharedState,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let app_state = Arc::new(AppState {
        version: env!("CARGO_PKG_VERSION"),
        trackers,
        state,
    });
    let app = create_router(app_state);

    let addr: SocketAddr = format!("{}:{}", listen, port).parse()?;
    tracing::info!("Starting HTTP API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("HTTP API server shutting down gracefully");
        })
        .await?;

    Ok(())
}
