//! SQLite persistence: connection pool, embedded migrations, row types and
//! the synchronous queries the planner runs on blocking threads.

pub mod connection;
pub mod models;
pub mod schema;
pub mod store;

pub use connection::{DbPool, create_pool, normalize_database_url, run_migrations};
