//! Route registration.
//! Builds the API router and applies the authentication and tracking layers.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{handlers, middleware::AppState};

/// Request bodies are small JSON documents; anything bigger is noise.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Build the application router around a fully constructed state.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Public endpoints: probes and login.
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        // Trusted external forms authenticate with a shared secret, not JWT.
        .route(
            "/api/v1/integrations/forms",
            post(handlers::task::create_task_from_form),
        );

    let authenticated_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::get_current_user))

        // Tasks
        .route(
            "/api/v1/tasks",
            get(handlers::task::list_tasks).post(handlers::task::create_task),
        )
        .route("/api/v1/tasks/my", get(handlers::task::my_tasks))
        .route("/api/v1/tasks/assigned", get(handlers::task::assigned_to_me))
        .route("/api/v1/tasks/queue", get(handlers::task::active_queue))
        .route("/api/v1/tasks/archive", get(handlers::task::archive))
        .route(
            "/api/v1/tasks/by-number/{number}",
            get(handlers::task::get_task_by_number),
        )
        .route(
            "/api/v1/tasks/{id}",
            get(handlers::task::get_task).put(handlers::task::update_task),
        )
        .route(
            "/api/v1/tasks/{id}/status",
            post(handlers::task::transition_status),
        )
        .route("/api/v1/tasks/{id}/assign", post(handlers::task::assign_task))

        // User management
        .route(
            "/api/v1/users",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/api/v1/users/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::deactivate_user),
        )

        // Analytics
        .route("/api/v1/analytics/performance", get(handlers::analytics::performance))
        .route("/api/v1/analytics/overdue", get(handlers::analytics::overdue))
        .route(
            "/api/v1/analytics/users/{id}",
            get(handlers::analytics::user_performance),
        )
        .route(
            "/api/v1/analytics/departments/{department}",
            get(handlers::analytics::department_performance),
        )

        // Settings and integrations
        .route(
            "/api/v1/settings",
            get(handlers::settings::list_settings).post(handlers::settings::set_setting),
        )
        .route(
            "/api/v1/settings/telegram",
            get(handlers::settings::get_telegram_settings)
                .put(handlers::settings::save_telegram_settings),
        )
        .route(
            "/api/v1/settings/telegram/test",
            post(handlers::settings::test_telegram_connection),
        )
        .route(
            "/api/v1/settings/directory",
            get(handlers::settings::get_directory_settings)
                .put(handlers::settings::save_directory_settings),
        )
        .route(
            "/api/v1/settings/directory/test",
            post(handlers::settings::test_directory_connection),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.jwt_service.clone(),
            crate::auth::middleware::jwt_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(axum::middleware::from_fn(
            crate::middleware::request_tracking_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
