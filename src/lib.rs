//! Travel Planner - plan trips around artworks from the Art Institute of Chicago
//!
//! This library provides the travel project and place management behind the
//! HTTP API: persistence, catalog lookups, caching and the axum router.

pub mod api;
pub mod art_institute;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod planner;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use art_institute::{ArtInstituteClient, Artwork, ArtworkCatalog, CachedCatalog};
pub use cache::PersistentCache;
pub use config::TravelPlannerConfig;
pub use error::TravelPlannerError;
pub use models::{ProjectPlace, TravelProject};
pub use planner::TravelPlanner;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TravelPlannerError>;
