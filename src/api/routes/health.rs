use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::state::AppState;
use crate::infrastructure::ProcessStats;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub info: ProcessStats,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".into(),
        info: state.monitor.sample(),
    })
}
