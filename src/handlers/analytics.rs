//! Analytics handlers (admin gate).

use crate::{
    auth::middleware::AuthContext, error::AppError, middleware::AppState, models::user::Gate,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

impl WindowQuery {
    fn days(&self) -> i64 {
        self.days
            .unwrap_or(crate::services::analytics_service::DEFAULT_WINDOW_DAYS)
            .clamp(1, 365)
    }
}

pub async fn performance(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let stats = state.analytics_service.performance_stats().await?;

    Ok(Json(stats))
}

pub async fn overdue(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let analysis = state.analytics_service.overdue_analysis().await?;

    Ok(Json(analysis))
}

pub async fn user_performance(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(user_id): Path<Uuid>,
    Query(window): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let report = state
        .analytics_service
        .user_performance(user_id, window.days())
        .await?;

    Ok(Json(report))
}

pub async fn department_performance(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(department): Path<String>,
    Query(window): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let report = state
        .analytics_service
        .department_performance(&department, window.days())
        .await?;

    Ok(Json(report))
}
