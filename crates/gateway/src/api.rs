use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use domain::{DeviceHealth, DeviceStatus, DomainError, OutputState};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 50;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/sensors", get(get_sensors))
        .route("/snapshot", get(get_snapshot))
        .route("/devices", get(get_devices))
        .route("/relays", get(get_relays))
        .route("/relay/{index}", post(set_relay))
        .route("/relay/{index}/toggle", post(toggle_relay))
        .route("/alarms", get(get_alarms))
        .route("/alarms/history", get(get_alarm_history))
        .route("/alarms/clear", post(clear_alarms))
        .route("/health", get(get_health))
        .route("/settings", get(get_settings))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Domain errors as HTTP responses with a JSON body
pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::InvalidChannel(_) | DomainError::InvalidConfiguration(_) => {
                StatusCode::BAD_REQUEST
            }
            DomainError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn get_sensors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.read_snapshot().sensor_fields())
}

async fn get_snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.read_snapshot())
}

#[derive(Serialize)]
struct DeviceView {
    #[serde(flatten)]
    status: DeviceStatus,
    health: DeviceHealth,
}

async fn get_devices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let list: Vec<_> = state
        .store
        .read_snapshot()
        .devices
        .into_values()
        .map(|status| DeviceView {
            health: status.health(),
            status,
        })
        .collect();
    Json(list)
}

async fn get_relays(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.outputs.states())
}

#[derive(Deserialize)]
struct SetRelay {
    state: bool,
}

async fn set_relay(
    Path(index): Path<usize>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SetRelay>,
) -> Result<Json<OutputState>, ApiError> {
    let output = state.outputs.set(index, payload.state).await?;
    Ok(Json(output))
}

async fn toggle_relay(
    Path(index): Path<usize>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let energized = state.outputs.toggle(index).await?;
    Ok(Json(json!({ "channel": index, "state": energized })))
}

async fn get_alarms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.alarms.active())
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn get_alarm_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    Json(state.alarms.history(query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT)))
}

#[derive(Deserialize)]
struct ClearQuery {
    sensor: Option<String>,
}

async fn clear_alarms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClearQuery>,
) -> impl IntoResponse {
    let cleared = state.alarms.clear(query.sensor.as_deref());
    Json(json!({ "cleared": cleared }))
}

async fn get_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.store.read_snapshot();
    let online = snapshot
        .devices
        .values()
        .filter(|s| s.health().is_healthy())
        .count();

    Json(json!({
        "gateway": state.settings.gateway_name,
        "phase": state.scheduler.phase(),
        "stats": state.scheduler.stats(),
        "persistence_failures": state.persister.failures(),
        "cycle": snapshot.cycle,
        "devices_online": online,
        "devices_total": snapshot.devices.len(),
    }))
}

async fn get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.settings.clone())
}
