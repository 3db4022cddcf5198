//! Authentication handlers.

use crate::{
    auth::middleware::AuthContext, error::AppError, middleware::AppState,
    models::auth::LoginRequest,
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// Login with local or directory credentials.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;

    Ok(Json(response))
}

/// Current caller identity and capabilities.
pub async fn get_current_user(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    let capabilities = auth_context.capabilities();

    Ok(Json(json!({
        "id": auth_context.user_id,
        "username": auth_context.username,
        "email": auth_context.email,
        "role": auth_context.role.as_str(),
        "capabilities": capabilities,
    })))
}
