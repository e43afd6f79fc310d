//! Synchronous queries over a single SQLite connection.
//!
//! Callers own transaction boundaries; every function here takes the
//! connection it should run on.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use super::models::{
    NewPlaceRow, NewProjectRow, PlaceChangeset, PlaceRow, ProjectChangeset, ProjectRow,
};
use super::schema::{project_places, travel_projects};
use crate::models::{ProjectPlace, TravelProject, is_completed};
use crate::{Result, TravelPlannerError};

fn places_of(conn: &mut SqliteConnection, project_id: i32) -> Result<Vec<ProjectPlace>> {
    let rows = project_places::table
        .filter(project_places::project_id.eq(project_id))
        .order(project_places::id.asc())
        .select(PlaceRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(ProjectPlace::from).collect())
}

pub fn project_exists(conn: &mut SqliteConnection, project_id: i32) -> Result<bool> {
    let exists = diesel::select(diesel::dsl::exists(
        travel_projects::table.filter(travel_projects::id.eq(project_id)),
    ))
    .get_result(conn)?;
    Ok(exists)
}

/// Loads a project with its places ordered by id.
pub fn find_project(conn: &mut SqliteConnection, project_id: i32) -> Result<Option<TravelProject>> {
    let row = travel_projects::table
        .find(project_id)
        .select(ProjectRow::as_select())
        .first(conn)
        .optional()?;

    match row {
        Some(row) => {
            let places = places_of(conn, row.id)?;
            Ok(Some(row.into_project(places)))
        }
        None => Ok(None),
    }
}

pub fn count_projects(conn: &mut SqliteConnection) -> Result<i64> {
    Ok(travel_projects::table.count().get_result(conn)?)
}

/// One page of projects ordered by id, places loaded in a single query.
pub fn list_projects(
    conn: &mut SqliteConnection,
    skip: u32,
    limit: u32,
) -> Result<Vec<TravelProject>> {
    let rows = travel_projects::table
        .order(travel_projects::id.asc())
        .offset(i64::from(skip))
        .limit(i64::from(limit))
        .select(ProjectRow::as_select())
        .load(conn)?;

    let places = PlaceRow::belonging_to(&rows)
        .order(project_places::id.asc())
        .select(PlaceRow::as_select())
        .load(conn)?;

    Ok(places
        .grouped_by(&rows)
        .into_iter()
        .zip(rows)
        .map(|(places, row)| row.into_project(places.into_iter().map(ProjectPlace::from).collect()))
        .collect())
}

pub fn insert_project(conn: &mut SqliteConnection, project: &NewProjectRow) -> Result<ProjectRow> {
    Ok(diesel::insert_into(travel_projects::table)
        .values(project)
        .returning(ProjectRow::as_returning())
        .get_result(conn)?)
}

pub fn update_project(
    conn: &mut SqliteConnection,
    project_id: i32,
    changes: &ProjectChangeset,
) -> Result<()> {
    if changes.is_empty() {
        return Ok(());
    }
    diesel::update(travel_projects::table.find(project_id))
        .set(changes)
        .execute(conn)?;
    Ok(())
}

/// Deletes a project and its places.
pub fn delete_project(conn: &mut SqliteConnection, project_id: i32) -> Result<bool> {
    diesel::delete(project_places::table.filter(project_places::project_id.eq(project_id)))
        .execute(conn)?;
    let deleted = diesel::delete(travel_projects::table.find(project_id)).execute(conn)?;
    Ok(deleted > 0)
}

pub fn has_visited_places(conn: &mut SqliteConnection, project_id: i32) -> Result<bool> {
    let visited = diesel::select(diesel::dsl::exists(
        project_places::table
            .filter(project_places::project_id.eq(project_id))
            .filter(project_places::visited.eq(true)),
    ))
    .get_result(conn)?;
    Ok(visited)
}

pub fn count_places(conn: &mut SqliteConnection, project_id: i32) -> Result<i64> {
    Ok(project_places::table
        .filter(project_places::project_id.eq(project_id))
        .count()
        .get_result(conn)?)
}

pub fn place_exists_for_artwork(
    conn: &mut SqliteConnection,
    project_id: i32,
    external_place_id: i64,
) -> Result<bool> {
    let exists = diesel::select(diesel::dsl::exists(
        project_places::table
            .filter(project_places::project_id.eq(project_id))
            .filter(project_places::external_place_id.eq(external_place_id)),
    ))
    .get_result(conn)?;
    Ok(exists)
}

/// Inserts a place; the `(project_id, external_place_id)` constraint surfaces
/// as a duplicate-place rule violation.
pub fn insert_place(conn: &mut SqliteConnection, place: &NewPlaceRow) -> Result<ProjectPlace> {
    let row = diesel::insert_into(project_places::table)
        .values(place)
        .returning(PlaceRow::as_returning())
        .get_result(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                TravelPlannerError::duplicate_place(place.external_place_id)
            }
            other => other.into(),
        })?;
    Ok(row.into())
}

pub fn list_places(conn: &mut SqliteConnection, project_id: i32) -> Result<Vec<ProjectPlace>> {
    places_of(conn, project_id)
}

pub fn find_place(
    conn: &mut SqliteConnection,
    project_id: i32,
    place_id: i32,
) -> Result<Option<ProjectPlace>> {
    let row = project_places::table
        .filter(project_places::id.eq(place_id))
        .filter(project_places::project_id.eq(project_id))
        .select(PlaceRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(ProjectPlace::from))
}

pub fn update_place(
    conn: &mut SqliteConnection,
    place_id: i32,
    changes: &PlaceChangeset,
) -> Result<()> {
    if changes.is_empty() {
        return Ok(());
    }
    diesel::update(project_places::table.find(place_id))
        .set(changes)
        .execute(conn)?;
    Ok(())
}

pub fn delete_place(conn: &mut SqliteConnection, place_id: i32) -> Result<bool> {
    let deleted = diesel::delete(project_places::table.find(place_id)).execute(conn)?;
    Ok(deleted > 0)
}

/// Re-derives `completed` from the project's places and stores it.
pub fn refresh_completion(conn: &mut SqliteConnection, project_id: i32) -> Result<bool> {
    let visited: Vec<bool> = project_places::table
        .filter(project_places::project_id.eq(project_id))
        .select(project_places::visited)
        .load(conn)?;
    let completed = is_completed(visited);

    diesel::update(travel_projects::table.find(project_id))
        .set(travel_projects::completed.eq(completed))
        .execute(conn)?;
    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};

    fn conn() -> diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>> {
        let pool = create_pool(":memory:", 1).unwrap();
        run_migrations(&pool).unwrap();
        pool.get().unwrap()
    }

    fn new_project(conn: &mut SqliteConnection, name: &str) -> ProjectRow {
        insert_project(
            conn,
            &NewProjectRow {
                name: name.to_string(),
                description: None,
                start_date: None,
                completed: false,
            },
        )
        .unwrap()
    }

    fn new_place(project_id: i32, external_place_id: i64) -> NewPlaceRow {
        NewPlaceRow {
            project_id,
            external_place_id,
            title: format!("Artwork {external_place_id}"),
            notes: None,
            visited: false,
        }
    }

    #[test]
    fn test_insert_and_find_project_with_places() {
        let mut conn = conn();
        let project = new_project(&mut conn, "Chicago");
        insert_place(&mut conn, &new_place(project.id, 27992)).unwrap();
        insert_place(&mut conn, &new_place(project.id, 28560)).unwrap();

        let found = find_project(&mut conn, project.id).unwrap().unwrap();
        assert_eq!(found.name, "Chicago");
        assert_eq!(found.places.len(), 2);
        assert_eq!(found.places[0].external_place_id, 27992);
        assert!(find_project(&mut conn, project.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_place_is_rule_violation() {
        let mut conn = conn();
        let project = new_project(&mut conn, "Chicago");
        insert_place(&mut conn, &new_place(project.id, 1)).unwrap();

        let err = insert_place(&mut conn, &new_place(project.id, 1)).unwrap_err();
        assert!(matches!(err, TravelPlannerError::Rule { .. }));
        assert!(place_exists_for_artwork(&mut conn, project.id, 1).unwrap());
        assert!(!place_exists_for_artwork(&mut conn, project.id, 2).unwrap());
    }

    #[test]
    fn test_list_projects_pages_and_groups_places() {
        let mut conn = conn();
        let first = new_project(&mut conn, "First");
        let second = new_project(&mut conn, "Second");
        let third = new_project(&mut conn, "Third");
        insert_place(&mut conn, &new_place(second.id, 10)).unwrap();
        insert_place(&mut conn, &new_place(third.id, 20)).unwrap();
        insert_place(&mut conn, &new_place(third.id, 21)).unwrap();

        assert_eq!(count_projects(&mut conn).unwrap(), 3);

        let page = list_projects(&mut conn, 1, 5).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, second.id);
        assert_eq!(page[0].places.len(), 1);
        assert_eq!(page[1].places.len(), 2);

        let page = list_projects(&mut conn, 0, 1).unwrap();
        assert_eq!(page[0].id, first.id);
        assert!(page[0].places.is_empty());
    }

    #[test]
    fn test_refresh_completion() {
        let mut conn = conn();
        let project = new_project(&mut conn, "Chicago");
        assert!(!refresh_completion(&mut conn, project.id).unwrap());

        let place = insert_place(&mut conn, &new_place(project.id, 1)).unwrap();
        update_place(
            &mut conn,
            place.id,
            &PlaceChangeset {
                notes: None,
                visited: Some(true),
            },
        )
        .unwrap();
        assert!(refresh_completion(&mut conn, project.id).unwrap());
        assert!(has_visited_places(&mut conn, project.id).unwrap());
        assert!(find_project(&mut conn, project.id).unwrap().unwrap().completed);
    }

    #[test]
    fn test_delete_project_removes_places() {
        let mut conn = conn();
        let project = new_project(&mut conn, "Chicago");
        insert_place(&mut conn, &new_place(project.id, 1)).unwrap();

        assert!(delete_project(&mut conn, project.id).unwrap());
        assert_eq!(count_places(&mut conn, project.id).unwrap(), 0);
        assert!(!project_exists(&mut conn, project.id).unwrap());
        assert!(!delete_project(&mut conn, project.id).unwrap());
    }

    #[test]
    fn test_update_project_changeset() {
        let mut conn = conn();
        let project = new_project(&mut conn, "Chicago");

        update_project(
            &mut conn,
            project.id,
            &ProjectChangeset {
                name: Some("Chicago in June".to_string()),
                description: Some(Some("Museums".to_string())),
                start_date: None,
            },
        )
        .unwrap();
        update_project(&mut conn, project.id, &ProjectChangeset::default()).unwrap();

        let found = find_project(&mut conn, project.id).unwrap().unwrap();
        assert_eq!(found.name, "Chicago in June");
        assert_eq!(found.description.as_deref(), Some("Museums"));
    }

    #[test]
    fn test_find_place_requires_matching_project() {
        let mut conn = conn();
        let project = new_project(&mut conn, "A");
        let other = new_project(&mut conn, "B");
        let place = insert_place(&mut conn, &new_place(project.id, 1)).unwrap();

        assert!(find_place(&mut conn, project.id, place.id).unwrap().is_some());
        assert!(find_place(&mut conn, other.id, place.id).unwrap().is_none());
        assert!(delete_place(&mut conn, place.id).unwrap());
        assert!(list_places(&mut conn, project.id).unwrap().is_empty());
    }
}
