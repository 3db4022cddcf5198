//! JWT authentication middleware and the per-request identity context.

use crate::{
    auth::jwt::JwtService,
    error::AppError,
    models::user::{Capabilities, Gate, Role},
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated identity, attached to request extensions and passed
/// explicitly to every service call. There is no ambient current-user state.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl AuthContext {
    /// Reject the request unless the caller's role meets the gate.
    /// Produces AuthorizationDenied, distinct from AuthenticationRequired.
    pub fn require(&self, gate: Gate) -> Result<(), AppError> {
        if self.role.meets(gate) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user_id,
                role = %self.role,
                gate = ?gate,
                "Gate check failed"
            );
            Err(AppError::Forbidden)
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.role.capabilities()
    }
}

// Extract AuthContext directly in handlers.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Extract the bearer token from the Authorization header.
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .ok_or(AppError::Unauthorized)
}

/// JWT authentication middleware. Every route behind it carries a valid
/// AuthContext; a missing or invalid token is AuthenticationRequired.
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())?;

    let claims = jwt_service.validate_access_token(&token)?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    // A token minted before a role rename would carry an unknown tag;
    // treat it as an invalid credential rather than a validation error.
    let role = Role::try_from(claims.role.as_str()).map_err(|_| AppError::Unauthorized)?;

    let auth_context = AuthContext {
        user_id,
        username: claims.username,
        email: claims.email,
        role,
    };

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "someone".to_string(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_extract_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test_token_123".parse().unwrap());

        let token = extract_token(&headers).unwrap();
        assert_eq!(token, "test_token_123");
    }

    #[test]
    fn test_extract_token_missing() {
        let headers = HeaderMap::new();
        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn test_extract_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn test_require_gate() {
        assert!(context(Role::Admin).require(Gate::AdminOnly).is_ok());
        assert!(context(Role::ItStaff).require(Gate::AdminOnly).is_err());
        assert!(context(Role::User).require(Gate::ItStaffOrHigher).is_err());
        assert!(context(Role::User).require(Gate::UserOrHigher).is_ok());
    }

    #[test]
    fn test_gate_failure_is_forbidden_not_unauthorized() {
        let err = context(Role::User).require(Gate::AdminOnly).unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }
}
