//! Place endpoints, nested under a project.

use axum::{Json, extract::State, http::StatusCode};

use super::error::{AppError, ErrorBody};
use super::extract::{AppJson, AppPath};
use super::{AppState, HandlerResult};
use crate::models::{MessageResponse, PlaceCreate, PlaceUpdate, ProjectPlace};

/// Add an artwork from the Art Institute catalog to a project.
#[utoipa::path(
    post,
    path = "/projects/{project_id}/places",
    tag = "places",
    params(("project_id" = i32, Path, description = "Project id")),
    request_body = PlaceCreate,
    responses(
        (status = 201, description = "Place added", body = ProjectPlace),
        (status = 400, description = "Project full or artwork already added", body = ErrorBody),
        (status = 404, description = "Project or artwork not found", body = ErrorBody),
        (status = 422, description = "Invalid payload", body = ErrorBody),
        (status = 502, description = "Catalog unavailable", body = ErrorBody)
    )
)]
pub async fn add_place(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<i32>,
    AppJson(place): AppJson<PlaceCreate>,
) -> Result<(StatusCode, Json<ProjectPlace>), AppError> {
    let place = state.planner.add_place(project_id, place).await?;
    Ok((StatusCode::CREATED, Json(place)))
}

#[utoipa::path(
    get,
    path = "/projects/{project_id}/places",
    tag = "places",
    params(("project_id" = i32, Path, description = "Project id")),
    responses(
        (status = 200, description = "Places of the project", body = [ProjectPlace]),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn list_places(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<i32>,
) -> HandlerResult<Vec<ProjectPlace>> {
    Ok(Json(state.planner.list_places(project_id).await?))
}

#[utoipa::path(
    get,
    path = "/projects/{project_id}/places/{place_id}",
    tag = "places",
    params(
        ("project_id" = i32, Path, description = "Project id"),
        ("place_id" = i32, Path, description = "Place id")
    ),
    responses(
        (status = 200, description = "The place", body = ProjectPlace),
        (status = 404, description = "Place not found", body = ErrorBody)
    )
)]
pub async fn get_place(
    State(state): State<AppState>,
    AppPath((project_id, place_id)): AppPath<(i32, i32)>,
) -> HandlerResult<ProjectPlace> {
    Ok(Json(state.planner.get_place(project_id, place_id).await?))
}

/// Update notes or mark a place visited. Visiting the last open place
/// completes the project.
#[utoipa::path(
    put,
    path = "/projects/{project_id}/places/{place_id}",
    tag = "places",
    params(
        ("project_id" = i32, Path, description = "Project id"),
        ("place_id" = i32, Path, description = "Place id")
    ),
    request_body = PlaceUpdate,
    responses(
        (status = 200, description = "Updated place", body = ProjectPlace),
        (status = 404, description = "Place not found", body = ErrorBody),
        (status = 422, description = "Invalid payload", body = ErrorBody)
    )
)]
pub async fn update_place(
    State(state): State<AppState>,
    AppPath((project_id, place_id)): AppPath<(i32, i32)>,
    AppJson(update): AppJson<PlaceUpdate>,
) -> HandlerResult<ProjectPlace> {
    Ok(Json(
        state
            .planner
            .update_place(project_id, place_id, update)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/projects/{project_id}/places/{place_id}",
    tag = "places",
    params(
        ("project_id" = i32, Path, description = "Project id"),
        ("place_id" = i32, Path, description = "Place id")
    ),
    responses(
        (status = 200, description = "Place deleted", body = MessageResponse),
        (status = 404, description = "Place not found", body = ErrorBody)
    )
)]
pub async fn delete_place(
    State(state): State<AppState>,
    AppPath((project_id, place_id)): AppPath<(i32, i32)>,
) -> HandlerResult<MessageResponse> {
    Ok(Json(state.planner.delete_place(project_id, place_id).await?))
}
