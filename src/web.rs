use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::art_institute::{ArtInstituteClient, CachedCatalog};
use crate::cache::PersistentCache;
use crate::config::{ServerConfig, TravelPlannerConfig};
use crate::db::{create_pool, run_migrations};
use crate::planner::TravelPlanner;

/// Opens the database, applies migrations and wires the cached catalog client.
pub fn build_state(config: &TravelPlannerConfig) -> Result<AppState> {
    let pool = create_pool(&config.database.url, config.database.pool_size)
        .context("Failed to create database pool")?;
    run_migrations(&pool).context("Failed to run database migrations")?;

    let cache = PersistentCache::open(&config.cache.location)
        .with_context(|| format!("Failed to open cache at {}", config.cache.location))?;
    let client = ArtInstituteClient::new(&config.art_api)?;
    let catalog = CachedCatalog::new(
        client,
        cache,
        Duration::from_secs(config.cache.ttl_seconds),
    );

    Ok(AppState::new(TravelPlanner::new(pool, Arc::new(catalog))))
}

/// The API router with CORS, tracing, timeout and body limit layers.
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::router(state)
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_seconds),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(config: TravelPlannerConfig) -> Result<()> {
    let state = build_state(&config)?;
    let app = app(state, &config.server);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);
    tracing::info!("API docs at http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
