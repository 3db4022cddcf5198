//! Health check handlers: /health and /ready.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{db, middleware::AppState};

/// Liveness probe response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Readiness probe response
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<HealthCheck>,
}

#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

static APP_START_TIME: std::sync::OnceLock<u64> = std::sync::OnceLock::new();

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Record the application start time. Called once from main.
pub fn set_start_time() {
    let _ = APP_START_TIME.set(now_secs());
}

pub fn get_uptime() -> u64 {
    APP_START_TIME
        .get()
        .map_or(0, |start| now_secs().saturating_sub(*start))
}

/// Liveness probe. Fast, no dependency checks.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: get_uptime(),
    })
}

/// Readiness probe. Checks the database.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    db::record_pool_metrics(&state.db);

    let db_check = match db::health_check(&state.db).await {
        db::HealthStatus::Healthy => HealthCheck {
            name: "database".to_string(),
            status: "ok".to_string(),
            message: None,
        },
        db::HealthStatus::Unhealthy(message) => HealthCheck {
            name: "database".to_string(),
            status: "failed".to_string(),
            message: Some(message),
        },
    };

    let ready = db_check.status == "ok";

    Json(ReadinessResponse {
        ready,
        checks: vec![db_check],
    })
}
