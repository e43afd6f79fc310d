//! Travel projects, their places, and the request/response payloads of the API.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::{PlaceChangeset, ProjectChangeset};
use crate::{Result, TravelPlannerError};

/// Upper bound on places in one project
pub const MAX_PLACES_PER_PROJECT: usize = 10;
/// Upper bound on a project name, in characters
pub const MAX_PROJECT_NAME_LEN: usize = 200;
/// Largest page `list_projects` returns
pub const MAX_PAGE_SIZE: u32 = 100;

/// An artwork to visit, as stored in a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProjectPlace {
    pub id: i32,
    pub project_id: i32,
    /// ID from Art Institute API
    pub external_place_id: i64,
    /// Artwork title copied from the Art Institute API
    pub title: String,
    pub notes: Option<String>,
    pub visited: bool,
}

/// A planned trip with the places it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TravelProject {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    /// Set automatically once every place is visited
    pub completed: bool,
    pub places: Vec<ProjectPlace>,
}

/// A project is complete when it has places and all of them are visited.
pub fn is_completed(visited: impl IntoIterator<Item = bool>) -> bool {
    let mut any = false;
    for place_visited in visited {
        if !place_visited {
            return false;
        }
        any = true;
    }
    any
}

/// Treats an explicit `null` differently from an absent field:
/// absent → `None`, `null` → `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_PROJECT_NAME_LEN {
        return Err(TravelPlannerError::validation(format!(
            "name must be between 1 and {MAX_PROJECT_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Place to add to a project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlaceCreate {
    /// ID from Art Institute API
    pub external_place_id: i64,
    /// User notes about the place
    #[serde(default)]
    pub notes: Option<String>,
}

/// Changes to a place; omitted fields stay as they are
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PlaceUpdate {
    /// Updated notes; `null` clears them
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    /// Mark as visited
    #[serde(default)]
    pub visited: Option<bool>,
}

impl PlaceUpdate {
    pub fn into_changeset(self) -> PlaceChangeset {
        PlaceChangeset {
            notes: self.notes,
            visited: self.visited,
        }
    }
}

/// New project, optionally with its first places
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectCreate {
    /// Project name
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// List of places to add (max 10)
    #[serde(default)]
    pub places: Option<Vec<PlaceCreate>>,
}

impl ProjectCreate {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        let places = self.places.as_deref().unwrap_or_default();
        if places.len() > MAX_PLACES_PER_PROJECT {
            return Err(TravelPlannerError::validation(
                "Maximum 10 places allowed per project",
            ));
        }
        Ok(())
    }
}

/// Changes to a project; omitted fields stay as they are
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProjectUpdate {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    /// `null` clears the description
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// `null` clears the start date
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<Option<NaiveDate>>,
}

impl ProjectUpdate {
    pub fn validate(&self) -> Result<()> {
        match &self.name {
            Some(None) => Err(TravelPlannerError::validation("name cannot be null")),
            Some(Some(name)) => validate_name(name),
            None => Ok(()),
        }
    }

    pub fn into_changeset(self) -> ProjectChangeset {
        ProjectChangeset {
            name: self.name.flatten(),
            description: self.description,
            start_date: self.start_date,
        }
    }
}

fn default_limit() -> u32 {
    MAX_PAGE_SIZE
}

/// Pagination for the project listing
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Number of records to skip
    #[serde(default)]
    pub skip: u32,
    /// Maximum number of records to return (1-100)
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl Pagination {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(TravelPlannerError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

/// One page of projects plus the total count
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectListResponse {
    pub total: i64,
    pub projects: Vec<TravelProject>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    pub detail: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }
}
