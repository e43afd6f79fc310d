//! Error types and handling for the travel planner

use thiserror::Error;

/// Main error type for the travel planner
#[derive(Error, Debug)]
pub enum TravelPlannerError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request payload or parameter failed validation
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Requested project, place or artwork does not exist
    #[error("{message}")]
    NotFound { message: String },

    /// A business rule rejected the operation
    #[error("{message}")]
    Rule { message: String },

    /// The Art Institute API could not be reached or answered unexpectedly
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// Database operation errors
    #[error("Database error: {message}")]
    Database { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TravelPlannerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new business rule violation
    pub fn rule<S: Into<String>>(message: S) -> Self {
        Self::Rule {
            message: message.into(),
        }
    }

    /// Create a new upstream API error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create a new database error
    pub fn database<S: Into<String>>(message: S) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    pub fn project_not_found() -> Self {
        Self::not_found("Project not found")
    }

    pub fn place_not_found() -> Self {
        Self::not_found("Place not found")
    }

    pub fn artwork_not_found(artwork_id: i64) -> Self {
        Self::not_found(format!(
            "Artwork with ID {artwork_id} not found in Art Institute API"
        ))
    }

    pub fn duplicate_place(artwork_id: i64) -> Self {
        Self::rule(format!("Place {artwork_id} already exists in this project"))
    }

    pub fn too_many_places() -> Self {
        Self::rule("Maximum 10 places allowed per project")
    }

    /// Get a user-facing message, hiding internals of server-side failures
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TravelPlannerError::Validation { message }
            | TravelPlannerError::NotFound { message }
            | TravelPlannerError::Rule { message } => message.clone(),
            TravelPlannerError::Upstream { .. } => {
                "Art Institute API is unavailable. Please try again later.".to_string()
            }
            TravelPlannerError::Config { .. } => {
                "Configuration error. Please check the service settings.".to_string()
            }
            TravelPlannerError::Database { .. } => "Database operation failed.".to_string(),
            TravelPlannerError::Io { .. } => "File operation failed.".to_string(),
            TravelPlannerError::General { .. } => "Internal server error.".to_string(),
        }
    }
}

impl From<diesel::result::Error> for TravelPlannerError {
    fn from(err: diesel::result::Error) -> Self {
        TravelPlannerError::database(err.to_string())
    }
}

impl From<diesel::r2d2::PoolError> for TravelPlannerError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        TravelPlannerError::database(format!("connection pool: {err}"))
    }
}

impl From<tokio::task::JoinError> for TravelPlannerError {
    fn from(err: tokio::task::JoinError) -> Self {
        TravelPlannerError::general(format!("background task failed: {err}"))
    }
}
