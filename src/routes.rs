//! Routers per concern, plus health/readiness/version.

use crate::handlers::{attendance, auth, events};
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .with_state(state)
}

pub fn event_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(events::list).post(events::create))
        .route("/near", get(events::near))
        .route("/search", get(events::search))
        .route("/category/:category", get(events::by_category))
        .route(
            "/:id",
            get(events::read).put(events::update).delete(events::delete),
        )
        .route("/:id/attendees", get(events::attendees))
        .route(
            "/:id/attend",
            post(attendance::attend).delete(attendance::unattend),
        )
        .with_state(state)
}

/// Full API surface: auth and events under `/api`, probes at the root.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth_routes(state.clone()))
        .nest("/api/events", event_routes(state.clone()))
        .merge(common_routes_with_ready(state))
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadyBody>, (axum::http::StatusCode, Json<ReadyBody>)> {
    if state.storage.ping().await.is_err() {
        return Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: Some("unavailable"),
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        database: Some("ok"),
    }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Probes: GET /health, GET /ready (storage ping), GET /version.
pub fn common_routes_with_ready(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
