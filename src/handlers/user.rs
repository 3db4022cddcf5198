//! User management handlers (admin gate).

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::user::{CreateUserRequest, Gate, UpdateUserRequest, UserResponse},
    repository::UserRepository,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let repo = UserRepository::new(state.db.clone());
    let users: Vec<UserResponse> = repo
        .list()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let user = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let user = state.auth_service.update_user(id, req).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Soft deactivation. Accounts are never hard-deleted.
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    if id == auth_context.user_id {
        return Err(AppError::validation("Cannot deactivate your own account"));
    }

    let repo = UserRepository::new(state.db.clone());
    if !repo.deactivate(id).await? {
        return Err(AppError::not_found("user"));
    }

    tracing::info!(user_id = %id, by = %auth_context.user_id, "User deactivated");

    Ok(Json(json!({"message": "User deactivated"})))
}
