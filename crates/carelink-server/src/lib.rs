use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use carelink_api::auth::{self, AppState};
use carelink_api::middleware::require_auth;
use carelink_api::{analytics, messages, patients};
use carelink_types::api::HealthResponse;

/// Assemble the full API router. Split out of main so integration tests can
/// drive the service in-process.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        // Provider webhook, no bearer token
        .route("/delivery_report", post(messages::delivery_report))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/patients", post(patients::create_patient))
        .route("/patients", get(patients::list_patients))
        .route("/send_sms", post(messages::send_sms))
        .route("/get_logs", get(messages::get_logs))
        .route("/analytics", get(analytics::get_analytics))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "CareLink SMS API",
    })
}
