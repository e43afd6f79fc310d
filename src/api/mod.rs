//! HTTP API: routes, handlers and the JSON shapes they exchange.

pub mod docs;
pub mod error;
pub mod extract;
pub mod places;
pub mod projects;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::planner::TravelPlanner;
use error::AppError;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<TravelPlanner>,
}

impl AppState {
    pub fn new(planner: TravelPlanner) -> Self {
        Self {
            planner: Arc::new(planner),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub docs: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// Routes without middleware; `web::app` adds the tower layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{project_id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/projects/{project_id}/places",
            get(places::list_places).post(places::add_place),
        )
        .route(
            "/projects/{project_id}/places/",
            get(places::list_places).post(places::add_place),
        )
        .route(
            "/projects/{project_id}/places/{place_id}",
            get(places::get_place)
                .put(places::update_place)
                .delete(places::delete_place),
        )
        .merge(docs::router())
        .fallback(not_found)
        .with_state(state)
}

/// Service banner.
#[utoipa::path(
    get,
    path = "/",
    tag = "root",
    responses((status = 200, description = "Service banner", body = RootResponse))
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Travel Planner API".to_string(),
        version: crate::VERSION.to_string(),
        docs: "/docs".to_string(),
        status: "running".to_string(),
    })
}

/// Health check that also verifies the database answers.
#[utoipa::path(
    get,
    path = "/health",
    tag = "root",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = error::ErrorBody)
    )
)]
pub async fn health(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    if let Err(e) = state.planner.health().await {
        warn!(error = %e, "Health check failed");
        return Err(AppError::ServiceUnavailable(
            "Database unavailable".to_string(),
        ));
    }

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        database: "connected".to_string(),
    }))
}

async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}
