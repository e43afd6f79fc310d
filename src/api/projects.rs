//! Project endpoints.

use axum::{Json, extract::State, http::StatusCode};

use super::error::{AppError, ErrorBody};
use super::extract::{AppJson, AppPath, AppQuery};
use super::{AppState, HandlerResult};
use crate::models::{
    MessageResponse, Pagination, ProjectCreate, ProjectListResponse, ProjectUpdate, TravelProject,
};

/// Create a travel project, optionally with up to 10 places.
#[utoipa::path(
    post,
    path = "/projects",
    tag = "projects",
    request_body = ProjectCreate,
    responses(
        (status = 201, description = "Project created", body = TravelProject),
        (status = 400, description = "Same artwork listed twice", body = ErrorBody),
        (status = 404, description = "Artwork not in the catalog", body = ErrorBody),
        (status = 422, description = "Invalid payload", body = ErrorBody),
        (status = 502, description = "Catalog unavailable", body = ErrorBody)
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ProjectCreate>,
) -> Result<(StatusCode, Json<TravelProject>), AppError> {
    let project = state.planner.create_project(payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// List projects with pagination.
#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    params(Pagination),
    responses(
        (status = 200, description = "One page of projects", body = ProjectListResponse),
        (status = 422, description = "Invalid pagination", body = ErrorBody)
    )
)]
pub async fn list_projects(
    State(state): State<AppState>,
    AppQuery(pagination): AppQuery<Pagination>,
) -> HandlerResult<ProjectListResponse> {
    Ok(Json(state.planner.list_projects(pagination).await?))
}

#[utoipa::path(
    get,
    path = "/projects/{project_id}",
    tag = "projects",
    params(("project_id" = i32, Path, description = "Project id")),
    responses(
        (status = 200, description = "The project with its places", body = TravelProject),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<i32>,
) -> HandlerResult<TravelProject> {
    Ok(Json(state.planner.get_project(project_id).await?))
}

/// Update a project's name, description or start date.
#[utoipa::path(
    put,
    path = "/projects/{project_id}",
    tag = "projects",
    params(("project_id" = i32, Path, description = "Project id")),
    request_body = ProjectUpdate,
    responses(
        (status = 200, description = "Updated project", body = TravelProject),
        (status = 404, description = "Project not found", body = ErrorBody),
        (status = 422, description = "Invalid payload", body = ErrorBody)
    )
)]
pub async fn update_project(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<i32>,
    AppJson(update): AppJson<ProjectUpdate>,
) -> HandlerResult<TravelProject> {
    Ok(Json(state.planner.update_project(project_id, update).await?))
}

/// Delete a project. Refused once any of its places is visited.
#[utoipa::path(
    delete,
    path = "/projects/{project_id}",
    tag = "projects",
    params(("project_id" = i32, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 400, description = "Project has visited places", body = ErrorBody),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn delete_project(
    State(state): State<AppState>,
    AppPath(project_id): AppPath<i32>,
) -> HandlerResult<MessageResponse> {
    Ok(Json(state.planner.delete_project(project_id).await?))
}
