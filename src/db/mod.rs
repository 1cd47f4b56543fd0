//! Database access for inmo-api
//!
//! SQLite via sqlx. Tables are created in-process with
//! `CREATE TABLE IF NOT EXISTS`; tests run the same initializer against
//! `sqlite::memory:`.

pub mod contacts;
pub mod properties;

use crate::error::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS properties (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            locality TEXT NOT NULL,
            neighbourhood TEXT,
            description TEXT NOT NULL,
            property_type TEXT NOT NULL,
            subtype TEXT NOT NULL,
            category TEXT NOT NULL,
            price REAL,
            currency TEXT NOT NULL DEFAULT 'USD',
            total_surface REAL,
            covered_surface REAL,
            latitude REAL,
            longitude REAL,
            images TEXT NOT NULL DEFAULT '[]',
            video_url TEXT,
            pdf_url TEXT,
            specific_characteristics TEXT NOT NULL DEFAULT '{}',
            amenities TEXT NOT NULL DEFAULT '[]',
            internal_docs_urls TEXT NOT NULL DEFAULT '[]',
            property_source TEXT NOT NULL DEFAULT 'propia',
            private_notes TEXT,
            owner_id INTEGER,
            agent_id INTEGER,
            colleague_id INTEGER,
            is_published INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS owners (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            phone_number TEXT,
            email TEXT,
            private_notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS agents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            phone_number TEXT NOT NULL DEFAULT '',
            email TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS colleagues (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            agency_name TEXT,
            phone_number TEXT,
            email TEXT,
            private_notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (properties, owners, agents, colleagues)");

    Ok(())
}
