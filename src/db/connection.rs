//! Database connection management using Diesel ORM.
//!
//! Provides connection pooling, migration support, and per-connection
//! SQLite configuration.

use diesel::SqliteConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::path::Path;
use tracing::info;

use crate::{Result, TravelPlannerError};

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const MEMORY_DATABASE: &str = ":memory:";

/// Pragmas applied to every connection handed out by the pool.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Turn a `DATABASE_URL` into the filename SQLite opens.
///
/// Accepts `sqlite:///relative.db`, `sqlite:////absolute.db`, `sqlite://:memory:`,
/// `sqlite:path`, `file:` URIs and plain paths.
pub fn normalize_database_url(url: &str) -> Result<String> {
    let url = url.trim();
    let path = url
        .strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);

    if path.is_empty() {
        return Err(TravelPlannerError::config(format!(
            "DATABASE_URL '{url}' does not name a database file"
        )));
    }

    Ok(path.to_string())
}

/// Create a connection pool for the given database URL.
///
/// An in-memory database lives and dies with its connection, so it gets a
/// single-connection pool.
///
/// # Errors
/// Returns an error if the URL is malformed or the pool cannot be created.
pub fn create_pool(database_url: &str, pool_size: u32) -> Result<DbPool> {
    let database = normalize_database_url(database_url)?;
    ensure_parent_dir(&database)?;

    let in_memory = database == MEMORY_DATABASE;
    let max_size = if in_memory { 1 } else { pool_size.max(1) };
    let manager = ConnectionManager::<SqliteConnection>::new(database.as_str());

    let mut builder = Pool::builder().max_size(max_size);
    if in_memory {
        builder = builder.idle_timeout(None).max_lifetime(None);
    }

    let pool = builder
        .connection_customizer(Box::new(SqlitePragmas {
            busy_timeout_ms: 5000,
        }))
        .build(manager)
        .map_err(|e| TravelPlannerError::database(format!("Failed to open {database}: {e}")))?;

    info!(database = %database, max_size, "Database pool ready");
    Ok(pool)
}

fn ensure_parent_dir(database: &str) -> Result<()> {
    if database == MEMORY_DATABASE || database.starts_with("file:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(database).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Run all pending database migrations, returning how many were applied.
///
/// # Errors
/// Returns an error if migrations fail.
pub fn run_migrations(pool: &DbPool) -> Result<usize> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| TravelPlannerError::database(format!("Migration failed: {e}")))?;

    for version in &applied {
        info!(%version, "Applied migration");
    }
    Ok(applied.len())
}
