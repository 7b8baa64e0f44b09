//! HTTP endpoint handlers

use std::{sync::Arc, time::Duration};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{info, warn};

use crate::state::{AppState, Phase, INTERVAL_PRESETS_MINUTES};
use super::responses::{ApiResponse, ErrorResponse, HealthResponse, StatusResponse};

/// Handle POST /interval/:minutes - Select the interval of the current phase
pub async fn interval_handler(
    State(state): State<Arc<AppState>>,
    Path(minutes): Path<u64>,
) -> Result<Json<ApiResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !INTERVAL_PRESETS_MINUTES.contains(&minutes) {
        warn!("Rejected interval of {} minutes", minutes);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "interval must be one of {:?} minutes, got {}",
                INTERVAL_PRESETS_MINUTES, minutes
            ))),
        ));
    }

    state.select_interval(Duration::from_secs(minutes * 60));
    info!("Interval endpoint called - {} minutes selected", minutes);
    Ok(Json(ApiResponse::from_snapshot(
        format!("Interval set to {} minutes", minutes),
        state.snapshot(),
    )))
}

/// Handle POST /start/work - Start a focus phase
pub async fn start_work_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.start(Phase::Work);
    info!("Start-work endpoint called");
    Json(ApiResponse::running(
        "Focus phase started".to_string(),
        state.clock_face(),
    ))
}

/// Handle POST /start/rest - Start a rest phase
pub async fn start_rest_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.start(Phase::Rest);
    info!("Start-rest endpoint called");
    Json(ApiResponse::running(
        "Rest phase started".to_string(),
        state.clock_face(),
    ))
}

/// Handle POST /stop - Stop the countdown
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.stop();
    info!("Stop endpoint called");
    Json(ApiResponse::idle(
        "Timer stopped".to_string(),
        state.clock_face(),
    ))
}

/// Handle POST /skip - End the current phase now
pub async fn skip_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.skip();
    let snapshot = state.snapshot();
    info!("Skip endpoint called - {:?} is next", snapshot.phase);
    Json(ApiResponse::from_snapshot(
        format!("Skipped to {}", snapshot.phase.label()),
        snapshot,
    ))
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.snapshot(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
