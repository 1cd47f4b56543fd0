//! inmo-api library interface
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::{MediaLifecycle, MediaStore, PropertySync, RelaxationEngine};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Record synchronizer (owns the media lifecycle)
    pub sync: PropertySync,
    /// Query relaxation engine for public browse
    pub engine: RelaxationEngine,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, uploads_dir: &Path) -> Self {
        let store = MediaStore::new(uploads_dir);
        let media = MediaLifecycle::new(store);
        Self {
            sync: PropertySync::new(db.clone(), media),
            engine: RelaxationEngine::new(db.clone()),
            db,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState, uploads_dir: &Path) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::admin_routes())
        .merge(api::public_routes())
        .merge(api::contact_routes())
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(api::uploads::MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
