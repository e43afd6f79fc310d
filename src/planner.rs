//! Travel planning service
//!
//! Every project and place operation the API exposes lives here, together with
//! the rules that govern them: at most ten places per project, no artwork twice
//! in a project, places must exist in the Art Institute catalog, projects with
//! visited places cannot be deleted, and a project completes itself once all of
//! its places are visited.

use diesel::SqliteConnection;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task;
use tracing::{info, instrument};

use crate::art_institute::{Artwork, ArtworkCatalog};
use crate::db::models::{NewPlaceRow, NewProjectRow};
use crate::db::{DbPool, store};
use crate::models::{
    MAX_PLACES_PER_PROJECT, MessageResponse, Pagination, PlaceCreate, PlaceUpdate, ProjectCreate,
    ProjectListResponse, ProjectPlace, ProjectUpdate, TravelProject,
};
use crate::{Result, TravelPlannerError};

/// Service layer over the database pool and the artwork catalog
pub struct TravelPlanner {
    pool: DbPool,
    catalog: Arc<dyn ArtworkCatalog>,
}

impl TravelPlanner {
    pub fn new(pool: DbPool, catalog: Arc<dyn ArtworkCatalog>) -> Self {
        Self { pool, catalog }
    }

    /// Runs `f` on a pooled connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut *conn)
        })
        .await?
    }

    /// Same as [`Self::with_conn`] inside an immediate (write-locking) transaction.
    async fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    {
        self.with_conn(move |conn| conn.immediate_transaction(f)).await
    }

    async fn fetch_artwork(&self, artwork_id: i64) -> Result<Artwork> {
        self.catalog
            .get_artwork(artwork_id)
            .await?
            .ok_or_else(|| TravelPlannerError::artwork_not_found(artwork_id))
    }

    /// Checks the database answers; used by the health endpoint.
    pub async fn health(&self) -> Result<()> {
        use diesel::RunQueryDsl;
        self.with_conn(|conn| {
            diesel::sql_query("SELECT 1").execute(conn)?;
            Ok(())
        })
        .await
    }

    /// Create a project, validating every requested place against the catalog.
    /// Nothing is stored unless all places resolve.
    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_project(&self, payload: ProjectCreate) -> Result<TravelProject> {
        payload.validate()?;

        let requested = payload.places.unwrap_or_default();
        let mut seen = HashSet::with_capacity(requested.len());
        let mut resolved = Vec::with_capacity(requested.len());

        for place in requested {
            let artwork = self.fetch_artwork(place.external_place_id).await?;
            if seen.contains(&place.external_place_id) {
                return Err(TravelPlannerError::duplicate_place(place.external_place_id));
            }
            seen.insert(place.external_place_id);
            resolved.push((artwork, place.notes));
        }

        let new_project = NewProjectRow {
            name: payload.name,
            description: payload.description,
            start_date: payload.start_date,
            completed: false,
        };

        let project = self
            .in_transaction(move |conn| {
                let row = store::insert_project(conn, &new_project)?;
                for (artwork, notes) in resolved {
                    store::insert_place(
                        conn,
                        &NewPlaceRow {
                            project_id: row.id,
                            external_place_id: artwork.id,
                            title: artwork.title,
                            notes,
                            visited: false,
                        },
                    )?;
                }
                store::refresh_completion(conn, row.id)?;
                store::find_project(conn, row.id)?.ok_or_else(TravelPlannerError::project_not_found)
            })
            .await?;

        info!(project_id = project.id, places = project.places.len(), "Created project");
        Ok(project)
    }

    #[instrument(skip(self))]
    pub async fn list_projects(&self, pagination: Pagination) -> Result<ProjectListResponse> {
        pagination.validate()?;
        self.with_conn(move |conn| {
            let total = store::count_projects(conn)?;
            let projects = store::list_projects(conn, pagination.skip, pagination.limit)?;
            Ok(ProjectListResponse { total, projects })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_project(&self, project_id: i32) -> Result<TravelProject> {
        self.with_conn(move |conn| store::find_project(conn, project_id))
            .await?
            .ok_or_else(TravelPlannerError::project_not_found)
    }

    /// Update name, description or start date; omitted fields are untouched.
    #[instrument(skip(self, update))]
    pub async fn update_project(
        &self,
        project_id: i32,
        update: ProjectUpdate,
    ) -> Result<TravelProject> {
        update.validate()?;
        let changes = update.into_changeset();

        self.in_transaction(move |conn| {
            if !store::project_exists(conn, project_id)? {
                return Err(TravelPlannerError::project_not_found());
            }
            store::update_project(conn, project_id, &changes)?;
            store::find_project(conn, project_id)?.ok_or_else(TravelPlannerError::project_not_found)
        })
        .await
    }

    /// Delete a project and its places, unless any place was already visited.
    #[instrument(skip(self))]
    pub async fn delete_project(&self, project_id: i32) -> Result<MessageResponse> {
        self.in_transaction(move |conn| {
            if !store::project_exists(conn, project_id)? {
                return Err(TravelPlannerError::project_not_found());
            }
            if store::has_visited_places(conn, project_id)? {
                return Err(TravelPlannerError::rule(
                    "Cannot delete project with visited places",
                ));
            }
            store::delete_project(conn, project_id)?;
            Ok(())
        })
        .await?;

        info!(project_id, "Deleted project");
        Ok(MessageResponse::new("Project deleted successfully"))
    }

    /// Add a catalog artwork to an existing project.
    ///
    /// Capacity is checked before the catalog lookup and again under the
    /// write lock together with duplicates, since the lookup happens outside
    /// any transaction.
    #[instrument(skip(self, place), fields(external_place_id = place.external_place_id))]
    pub async fn add_place(&self, project_id: i32, place: PlaceCreate) -> Result<ProjectPlace> {
        self.with_conn(move |conn| ensure_capacity(conn, project_id))
            .await?;

        let artwork = self.fetch_artwork(place.external_place_id).await?;
        let requested_id = place.external_place_id;
        let notes = place.notes;

        let created = self
            .in_transaction(move |conn| {
                ensure_capacity(conn, project_id)?;
                if store::place_exists_for_artwork(conn, project_id, requested_id)? {
                    return Err(TravelPlannerError::duplicate_place(requested_id));
                }
                let created = store::insert_place(
                    conn,
                    &NewPlaceRow {
                        project_id,
                        external_place_id: artwork.id,
                        title: artwork.title,
                        notes,
                        visited: false,
                    },
                )?;
                store::refresh_completion(conn, project_id)?;
                Ok(created)
            })
            .await?;

        info!(project_id, place_id = created.id, "Added place");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_places(&self, project_id: i32) -> Result<Vec<ProjectPlace>> {
        self.with_conn(move |conn| {
            if !store::project_exists(conn, project_id)? {
                return Err(TravelPlannerError::project_not_found());
            }
            store::list_places(conn, project_id)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_place(&self, project_id: i32, place_id: i32) -> Result<ProjectPlace> {
        self.with_conn(move |conn| store::find_place(conn, project_id, place_id))
            .await?
            .ok_or_else(TravelPlannerError::place_not_found)
    }

    /// Update notes or the visited flag, then re-derive project completion.
    #[instrument(skip(self, update))]
    pub async fn update_place(
        &self,
        project_id: i32,
        place_id: i32,
        update: PlaceUpdate,
    ) -> Result<ProjectPlace> {
        let changes = update.into_changeset();

        self.in_transaction(move |conn| {
            if store::find_place(conn, project_id, place_id)?.is_none() {
                return Err(TravelPlannerError::place_not_found());
            }
            store::update_place(conn, place_id, &changes)?;
            let completed = store::refresh_completion(conn, project_id)?;
            tracing::debug!(project_id, completed, "Project completion re-evaluated");
            store::find_place(conn, project_id, place_id)?
                .ok_or_else(TravelPlannerError::place_not_found)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_place(&self, project_id: i32, place_id: i32) -> Result<MessageResponse> {
        self.in_transaction(move |conn| {
            if store::find_place(conn, project_id, place_id)?.is_none() {
                return Err(TravelPlannerError::place_not_found());
            }
            store::delete_place(conn, place_id)?;
            store::refresh_completion(conn, project_id)?;
            Ok(())
        })
        .await?;

        info!(project_id, place_id, "Deleted place");
        Ok(MessageResponse::new("Place deleted successfully"))
    }
}

/// The project must exist and have room for one more place.
fn ensure_capacity(conn: &mut SqliteConnection, project_id: i32) -> Result<()> {
    if !store::project_exists(conn, project_id)? {
        return Err(TravelPlannerError::project_not_found());
    }
    let count = store::count_places(conn, project_id)?;
    if count >= MAX_PLACES_PER_PROJECT as i64 {
        return Err(TravelPlannerError::too_many_places());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Knows artworks 1..=1000; 9999 simulates an unreachable API.
    #[derive(Default)]
    struct FakeCatalog {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ArtworkCatalog for FakeCatalog {
        async fn get_artwork(&self, artwork_id: i64) -> Result<Option<Artwork>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match artwork_id {
                9999 => Err(TravelPlannerError::upstream("connection refused")),
                1..=1000 => Ok(Some(Artwork {
                    id: artwork_id,
                    title: format!("Artwork {artwork_id}"),
                })),
                _ => Ok(None),
            }
        }
    }

    fn planner() -> (TravelPlanner, Arc<FakeCatalog>) {
        let pool = create_pool(":memory:", 1).unwrap();
        run_migrations(&pool).unwrap();
        let catalog = Arc::new(FakeCatalog::default());
        (TravelPlanner::new(pool, catalog.clone()), catalog)
    }

    fn create(name: &str, ids: &[i64]) -> ProjectCreate {
        ProjectCreate {
            name: name.to_string(),
            description: None,
            start_date: None,
            places: Some(
                ids.iter()
                    .map(|&id| PlaceCreate {
                        external_place_id: id,
                        notes: None,
                    })
                    .collect(),
            ),
        }
    }

    fn visit(visited: bool) -> PlaceUpdate {
        PlaceUpdate {
            notes: None,
            visited: Some(visited),
        }
    }

    #[tokio::test]
    async fn test_create_project_with_places() {
        let (planner, _) = planner();
        let project = planner.create_project(create("Chicago", &[1, 2])).await.unwrap();

        assert_eq!(project.places.len(), 2);
        assert_eq!(project.places[0].title, "Artwork 1");
        assert!(!project.completed);
    }

    #[tokio::test]
    async fn test_create_project_unknown_artwork_stores_nothing() {
        let (planner, _) = planner();
        let err = planner
            .create_project(create("Chicago", &[1, 2000]))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Artwork with ID 2000 not found in Art Institute API"
        );
        let listing = planner.list_projects(Pagination::default()).await.unwrap();
        assert_eq!(listing.total, 0);
    }

    #[tokio::test]
    async fn test_create_project_rejects_repeated_artwork() {
        let (planner, _) = planner();
        let err = planner
            .create_project(create("Chicago", &[3, 3]))
            .await
            .unwrap_err();
        assert!(matches!(err, TravelPlannerError::Rule { .. }));
        assert_eq!(err.to_string(), "Place 3 already exists in this project");
    }

    #[tokio::test]
    async fn test_create_project_too_many_places_skips_catalog() {
        let (planner, catalog) = planner();
        let ids: Vec<i64> = (1..=11).collect();
        let err = planner.create_project(create("Big", &ids)).await.unwrap_err();

        assert!(matches!(err, TravelPlannerError::Validation { .. }));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let (planner, _) = planner();
        let err = planner
            .create_project(create("Chicago", &[9999]))
            .await
            .unwrap_err();
        assert!(matches!(err, TravelPlannerError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_add_place_enforces_capacity() {
        let (planner, _) = planner();
        let ids: Vec<i64> = (1..=10).collect();
        let project = planner.create_project(create("Full", &ids)).await.unwrap();

        let err = planner
            .add_place(
                project.id,
                PlaceCreate {
                    external_place_id: 11,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Maximum 10 places allowed per project");
    }

    #[tokio::test]
    async fn test_add_place_checks_project_then_catalog_then_duplicates() {
        let (planner, catalog) = planner();

        let err = planner
            .add_place(
                42,
                PlaceCreate {
                    external_place_id: 1,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Project not found");
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);

        let project = planner.create_project(create("Chicago", &[1])).await.unwrap();

        let err = planner
            .add_place(
                project.id,
                PlaceCreate {
                    external_place_id: 5000,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TravelPlannerError::NotFound { .. }));

        let err = planner
            .add_place(
                project.id,
                PlaceCreate {
                    external_place_id: 1,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Place 1 already exists in this project");

        let place = planner
            .add_place(
                project.id,
                PlaceCreate {
                    external_place_id: 2,
                    notes: Some("Second floor".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(place.notes.as_deref(), Some("Second floor"));
        assert_eq!(planner.list_places(project.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_completion_follows_visited_places() {
        let (planner, _) = planner();
        let project = planner.create_project(create("Chicago", &[1, 2])).await.unwrap();
        let (first, second) = (project.places[0].id, project.places[1].id);

        planner.update_place(project.id, first, visit(true)).await.unwrap();
        assert!(!planner.get_project(project.id).await.unwrap().completed);

        planner.update_place(project.id, second, visit(true)).await.unwrap();
        assert!(planner.get_project(project.id).await.unwrap().completed);

        planner.update_place(project.id, second, visit(false)).await.unwrap();
        assert!(!planner.get_project(project.id).await.unwrap().completed);

        planner.update_place(project.id, second, visit(true)).await.unwrap();
        planner
            .add_place(
                project.id,
                PlaceCreate {
                    external_place_id: 3,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert!(!planner.get_project(project.id).await.unwrap().completed);
    }

    #[tokio::test]
    async fn test_deleting_places_re_evaluates_completion() {
        let (planner, _) = planner();
        let project = planner.create_project(create("Chicago", &[1, 2])).await.unwrap();
        let (visited, open) = (project.places[0].id, project.places[1].id);

        planner.update_place(project.id, visited, visit(true)).await.unwrap();
        assert!(!planner.get_project(project.id).await.unwrap().completed);

        planner.delete_place(project.id, open).await.unwrap();
        assert!(planner.get_project(project.id).await.unwrap().completed);

        planner.delete_place(project.id, visited).await.unwrap();
        let reopened = planner.get_project(project.id).await.unwrap();
        assert!(!reopened.completed);
        assert!(reopened.places.is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_artwork_id_goes_to_catalog() {
        let (planner, catalog) = planner();
        let project = planner.create_project(create("Chicago", &[])).await.unwrap();

        let err = planner
            .add_place(
                project.id,
                PlaceCreate {
                    external_place_id: 0,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Artwork with ID 0 not found in Art Institute API"
        );
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_project_blocked_by_visited_place() {
        let (planner, _) = planner();
        let project = planner.create_project(create("Chicago", &[1])).await.unwrap();
        planner
            .update_place(project.id, project.places[0].id, visit(true))
            .await
            .unwrap();

        let err = planner.delete_project(project.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete project with visited places");

        planner
            .update_place(project.id, project.places[0].id, visit(false))
            .await
            .unwrap();
        let message = planner.delete_project(project.id).await.unwrap();
        assert_eq!(message.message, "Project deleted successfully");
        assert!(matches!(
            planner.get_project(project.id).await,
            Err(TravelPlannerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_place_lookups_are_scoped_to_project() {
        let (planner, _) = planner();
        let a = planner.create_project(create("A", &[1])).await.unwrap();
        let b = planner.create_project(create("B", &[])).await.unwrap();
        let place_id = a.places[0].id;

        assert!(planner.get_place(a.id, place_id).await.is_ok());
        let err = planner.get_place(b.id, place_id).await.unwrap_err();
        assert_eq!(err.to_string(), "Place not found");
        assert!(planner.delete_place(b.id, place_id).await.is_err());

        let message = planner.delete_place(a.id, place_id).await.unwrap();
        assert_eq!(message.message, "Place deleted successfully");
    }

    #[tokio::test]
    async fn test_update_project_partial() {
        let (planner, _) = planner();
        let mut payload = create("Chicago", &[]);
        payload.description = Some("Museums".to_string());
        let project = planner.create_project(payload).await.unwrap();

        let updated = planner
            .update_project(
                project.id,
                ProjectUpdate {
                    name: Some(Some("Chicago 2025".to_string())),
                    ..ProjectUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Chicago 2025");
        assert_eq!(updated.description.as_deref(), Some("Museums"));

        let cleared = planner
            .update_project(
                project.id,
                ProjectUpdate {
                    description: Some(None),
                    ..ProjectUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.description.is_none());

        assert!(
            planner
                .update_project(999, ProjectUpdate::default())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_list_projects_pagination() {
        let (planner, _) = planner();
        for name in ["A", "B", "C"] {
            planner.create_project(create(name, &[])).await.unwrap();
        }

        let page = planner
            .list_projects(Pagination { skip: 1, limit: 1 })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.projects.len(), 1);
        assert_eq!(page.projects[0].name, "B");

        assert!(
            planner
                .list_projects(Pagination { skip: 0, limit: 0 })
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_health() {
        let (planner, _) = planner();
        assert!(planner.health().await.is_ok());
    }
}
