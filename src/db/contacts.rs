//! Read-only lookups for the contact entities referenced by properties
//!
//! Owners, agents and colleagues are managed elsewhere; the property
//! editor only needs to resolve and enumerate them.

use crate::error::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// A property owner
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: i64,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// A listing agent
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: i64,
    pub full_name: String,
    pub phone_number: String,
    pub email: Option<String>,
}

/// An external agency contact; source of third-party listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Colleague {
    pub id: i64,
    pub full_name: String,
    pub agency_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

fn row_to_owner(row: &SqliteRow) -> Owner {
    Owner {
        id: row.get("id"),
        full_name: row.get("full_name"),
        phone_number: row.get("phone_number"),
        email: row.get("email"),
    }
}

fn row_to_agent(row: &SqliteRow) -> Agent {
    Agent {
        id: row.get("id"),
        full_name: row.get("full_name"),
        phone_number: row.get("phone_number"),
        email: row.get("email"),
    }
}

fn row_to_colleague(row: &SqliteRow) -> Colleague {
    Colleague {
        id: row.get("id"),
        full_name: row.get("full_name"),
        agency_name: row.get("agency_name"),
        phone_number: row.get("phone_number"),
        email: row.get("email"),
    }
}

pub async fn find_owner(pool: &SqlitePool, id: i64) -> Result<Option<Owner>> {
    let row = sqlx::query("SELECT id, full_name, phone_number, email FROM owners WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(row_to_owner))
}

pub async fn find_agent(pool: &SqlitePool, id: i64) -> Result<Option<Agent>> {
    let row = sqlx::query("SELECT id, full_name, phone_number, email FROM agents WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(row_to_agent))
}

pub async fn find_colleague(pool: &SqlitePool, id: i64) -> Result<Option<Colleague>> {
    let row = sqlx::query(
        "SELECT id, full_name, agency_name, phone_number, email FROM colleagues WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(row_to_colleague))
}

pub async fn list_owners(pool: &SqlitePool) -> Result<Vec<Owner>> {
    let rows =
        sqlx::query("SELECT id, full_name, phone_number, email FROM owners ORDER BY full_name")
            .fetch_all(pool)
            .await?;
    Ok(rows.iter().map(row_to_owner).collect())
}

pub async fn list_agents(pool: &SqlitePool) -> Result<Vec<Agent>> {
    let rows =
        sqlx::query("SELECT id, full_name, phone_number, email FROM agents ORDER BY full_name")
            .fetch_all(pool)
            .await?;
    Ok(rows.iter().map(row_to_agent).collect())
}

pub async fn list_colleagues(pool: &SqlitePool) -> Result<Vec<Colleague>> {
    let rows = sqlx::query(
        "SELECT id, full_name, agency_name, phone_number, email FROM colleagues ORDER BY full_name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(row_to_colleague).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn owner_lookup_round_trip() {
        let pool = test_pool().await;
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO owners (full_name, phone_number, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind("Ana Torres")
        .bind("+54 11 5555-0001")
        .bind(&now)
        .bind(&now)
        .execute(&pool)
        .await
        .unwrap();

        let owner = find_owner(&pool, 1).await.unwrap().expect("owner exists");
        assert_eq!(owner.full_name, "Ana Torres");
        assert!(find_owner(&pool, 99).await.unwrap().is_none());
        assert_eq!(list_owners(&pool).await.unwrap().len(), 1);
    }
}
