//! System settings handlers (admin gate).

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::settings::{DirectorySettingsRequest, SetSettingRequest, TelegramSettingsRequest},
    models::user::Gate,
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

pub async fn list_settings(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let settings = state.settings_service.list().await?;

    Ok(Json(settings))
}

pub async fn set_setting(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<SetSettingRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    if req.key.trim().is_empty() {
        return Err(AppError::validation("Setting key must not be empty"));
    }

    let setting = state
        .settings_service
        .set(
            &req.key,
            &req.value,
            req.description.as_deref(),
            Some(auth_context.user_id),
        )
        .await?;

    Ok(Json(setting))
}

pub async fn get_telegram_settings(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let settings = state.settings_service.telegram_settings().await?;

    // The token never leaves the server; report only whether it is set.
    Ok(Json(json!({
        "bot_token_set": settings.bot_token.is_some(),
        "chat_id": settings.chat_id,
    })))
}

/// Save notifier settings and drop the notifier's credential cache so the
/// change takes effect immediately.
pub async fn save_telegram_settings(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<TelegramSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    state
        .settings_service
        .save_telegram_settings(&req, auth_context.user_id)
        .await?;
    state.notifier.reload().await;

    Ok(Json(json!({"message": "Telegram settings saved"})))
}

pub async fn test_telegram_connection(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let status = state.notifier.test_connection().await;

    Ok(Json(status))
}

pub async fn get_directory_settings(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let mut settings = state.settings_service.directory_settings().await?;
    settings.bind_password = String::new();

    Ok(Json(settings))
}

pub async fn save_directory_settings(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<DirectorySettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    state
        .settings_service
        .save_directory_settings(&req, auth_context.user_id)
        .await?;

    Ok(Json(json!({"message": "Directory settings saved"})))
}

pub async fn test_directory_connection(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require(Gate::AdminOnly)?;

    let settings = state.settings_service.directory_settings().await?;
    let status = state.directory.test_connection(&settings).await;

    Ok(Json(status))
}
