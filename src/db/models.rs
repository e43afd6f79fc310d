//! Database model types for Diesel ORM.

use chrono::NaiveDate;
use diesel::prelude::*;

use super::schema::{project_places, travel_projects};
use crate::models::{ProjectPlace, TravelProject};

/// Database row for a travel project.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = travel_projects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProjectRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub completed: bool,
}

impl ProjectRow {
    pub fn into_project(self, places: Vec<ProjectPlace>) -> TravelProject {
        TravelProject {
            id: self.id,
            name: self.name,
            description: self.description,
            start_date: self.start_date,
            completed: self.completed,
            places,
        }
    }
}

/// Database row for a travel project (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = travel_projects)]
pub struct NewProjectRow {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub completed: bool,
}

/// Partial update of a project; `None` leaves a column alone,
/// `Some(None)` clears a nullable one.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = travel_projects)]
pub struct ProjectChangeset {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<Option<NaiveDate>>,
}

impl ProjectChangeset {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.start_date.is_none()
    }
}

/// Database row for a place.
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(table_name = project_places)]
#[diesel(belongs_to(ProjectRow, foreign_key = project_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PlaceRow {
    pub id: i32,
    pub project_id: i32,
    pub external_place_id: i64,
    pub title: String,
    pub notes: Option<String>,
    pub visited: bool,
}

impl From<PlaceRow> for ProjectPlace {
    fn from(row: PlaceRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            external_place_id: row.external_place_id,
            title: row.title,
            notes: row.notes,
            visited: row.visited,
        }
    }
}

/// Database row for a place (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = project_places)]
pub struct NewPlaceRow {
    pub project_id: i32,
    pub external_place_id: i64,
    pub title: String,
    pub notes: Option<String>,
    pub visited: bool,
}

/// Partial update of a place.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = project_places)]
pub struct PlaceChangeset {
    pub notes: Option<Option<String>>,
    pub visited: Option<bool>,
}

impl PlaceChangeset {
    pub fn is_empty(&self) -> bool {
        self.notes.is_none() && self.visited.is_none()
    }
}
