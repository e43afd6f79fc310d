//! OpenAPI document and the pages that render it.

use axum::{Json, Router, response::Html, routing::get};
use utoipa::OpenApi;

use super::error::ErrorBody;
use super::{AppState, HealthResponse, RootResponse, places, projects};
use crate::models::{
    MessageResponse, PlaceCreate, PlaceUpdate, ProjectCreate, ProjectListResponse, ProjectPlace,
    ProjectUpdate, TravelProject,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Travel Planner API",
        description = "A RESTful API for managing travel projects and places to visit"
    ),
    paths(
        super::root,
        super::health,
        projects::create_project,
        projects::list_projects,
        projects::get_project,
        projects::update_project,
        projects::delete_project,
        places::add_place,
        places::list_places,
        places::get_place,
        places::update_place,
        places::delete_place,
    ),
    components(schemas(
        TravelProject,
        ProjectPlace,
        ProjectCreate,
        ProjectUpdate,
        PlaceCreate,
        PlaceUpdate,
        ProjectListResponse,
        MessageResponse,
        ErrorBody,
        RootResponse,
        HealthResponse,
    )),
    tags(
        (name = "root", description = "Service status"),
        (name = "projects", description = "Travel projects"),
        (name = "places", description = "Artworks to visit within a project")
    )
)]
pub struct ApiDoc;

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html>
<head>
  <title>Travel Planner API - Swagger UI</title>
  <meta charset="utf-8"/>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>"##;

const REDOC: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Travel Planner API - ReDoc</title>
  <meta charset="utf-8"/>
</head>
<body>
  <redoc spec-url="/openapi.json"></redoc>
  <script src="https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js"></script>
</body>
</html>"#;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(|| async { Html(SWAGGER_UI) }))
        .route("/redoc", get(|| async { Html(REDOC) }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    let mut doc = ApiDoc::openapi();
    doc.info.version = crate::VERSION.to_string();
    Json(doc)
}
