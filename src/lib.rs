pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod media;
pub mod middleware;
pub mod state;
pub mod store;
pub mod testing;
pub mod webhook;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

pub fn app(app_state: Arc<AppState>) -> Router {
    // Session-gated JSON API; the middleware answers 401, handlers enforce
    // ownership.
    let api = Router::new()
        .route(
            "/content/videos",
            get(handlers::videos::list).post(handlers::videos::upload),
        )
        .route(
            "/content/videos/:id",
            patch(handlers::videos::update).delete(handlers::videos::remove),
        )
        .route(
            "/content/images",
            get(handlers::images::list).post(handlers::images::upload),
        )
        .route(
            "/content/images/:id",
            patch(handlers::images::update).delete(handlers::images::remove),
        )
        .route("/identity/onboarding", patch(handlers::onboarding::submit))
        .route_layer(axum_middleware::from_fn(middleware::auth::require_session));

    Router::new()
        // Public
        .route("/", get(handlers::pages::root))
        .route("/health", get(health))
        .route("/identity/webhook", post(handlers::webhook::receive))
        // Pages (gated by the onboarding gate below)
        .route("/home", get(handlers::pages::home))
        .route("/sign-in", get(handlers::pages::sign_in))
        .route("/sign-up", get(handlers::pages::sign_up))
        .route("/onboarding", get(handlers::pages::onboarding))
        .merge(api)
        // Onboarding gate runs on every request, outermost
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            middleware::gate::onboarding_gate,
        ))
        // Global middleware
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": { "status": "degraded", "timestamp": now, "database_error": e.to_string() }
            })),
        ),
    }
}
