//! Property table operations
//!
//! Row mapping is done by hand; JSON-bearing columns (images, amenities,
//! specific_characteristics, internal_docs_urls) are stored as TEXT and
//! decoded with serde_json. Newest-first ordering ties are broken by id so
//! same-timestamp inserts stay deterministic.

use crate::error::{Error, Result};
use crate::models::{Property, PropertyDraft};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const ALL_COLUMNS: &str = "id, name, address, locality, neighbourhood, description, \
     property_type, subtype, category, price, currency, total_surface, covered_surface, \
     latitude, longitude, images, video_url, pdf_url, specific_characteristics, amenities, \
     internal_docs_urls, property_source, private_notes, owner_id, agent_id, colleague_id, \
     is_published, created_at, updated_at";

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database: {}", e)))
}

fn row_to_property(row: &SqliteRow) -> Result<Property> {
    let images_raw: String = row.get("images");
    let characteristics_raw: String = row.get("specific_characteristics");
    let amenities_raw: String = row.get("amenities");
    let internal_docs_raw: String = row.get("internal_docs_urls");
    let created_raw: String = row.get("created_at");
    let updated_raw: String = row.get("updated_at");

    Ok(Property {
        id: row.get("id"),
        name: row.get("name"),
        address: row.get("address"),
        locality: row.get("locality"),
        neighbourhood: row.get("neighbourhood"),
        description: row.get("description"),
        property_type: row.get("property_type"),
        subtype: row.get("subtype"),
        category: row.get("category"),
        price: row.get("price"),
        currency: row.get("currency"),
        total_surface: row.get("total_surface"),
        covered_surface: row.get("covered_surface"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        images: serde_json::from_str(&images_raw)?,
        video_url: row.get("video_url"),
        pdf_url: row.get("pdf_url"),
        specific_characteristics: serde_json::from_str(&characteristics_raw)?,
        amenities: serde_json::from_str(&amenities_raw)?,
        internal_docs_urls: serde_json::from_str(&internal_docs_raw)?,
        property_source: row.get("property_source"),
        private_notes: row.get("private_notes"),
        owner_id: row.get("owner_id"),
        agent_id: row.get("agent_id"),
        colleague_id: row.get("colleague_id"),
        is_published: row.get("is_published"),
        created_at: parse_timestamp(&created_raw)?,
        updated_at: parse_timestamp(&updated_raw)?,
    })
}

fn rows_to_properties(rows: Vec<SqliteRow>) -> Result<Vec<Property>> {
    rows.iter().map(row_to_property).collect()
}

/// Insert a new property record, returning its id
pub async fn insert(pool: &SqlitePool, draft: &PropertyDraft) -> Result<i64> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO properties (
            name, address, locality, neighbourhood, description,
            property_type, subtype, category, price, currency,
            total_surface, covered_surface, latitude, longitude,
            images, video_url, pdf_url, specific_characteristics,
            amenities, internal_docs_urls, property_source, private_notes,
            owner_id, agent_id, colleague_id, is_published,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&draft.name)
    .bind(&draft.address)
    .bind(&draft.locality)
    .bind(&draft.neighbourhood)
    .bind(&draft.description)
    .bind(&draft.property_type)
    .bind(&draft.subtype)
    .bind(&draft.category)
    .bind(draft.price)
    .bind(&draft.currency)
    .bind(draft.total_surface)
    .bind(draft.covered_surface)
    .bind(draft.latitude)
    .bind(draft.longitude)
    .bind(serde_json::to_string(&draft.images)?)
    .bind(&draft.video_url)
    .bind(&draft.pdf_url)
    .bind(serde_json::to_string(&draft.specific_characteristics)?)
    .bind(serde_json::to_string(&draft.amenities)?)
    .bind(serde_json::to_string(&draft.internal_docs_urls)?)
    .bind(&draft.property_source)
    .bind(&draft.private_notes)
    .bind(draft.owner_id)
    .bind(draft.agent_id)
    .bind(draft.colleague_id)
    .bind(draft.is_published)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite an existing record with the draft's content
pub async fn update(pool: &SqlitePool, id: i64, draft: &PropertyDraft) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE properties SET
            name = ?, address = ?, locality = ?, neighbourhood = ?, description = ?,
            property_type = ?, subtype = ?, category = ?, price = ?, currency = ?,
            total_surface = ?, covered_surface = ?, latitude = ?, longitude = ?,
            images = ?, video_url = ?, pdf_url = ?, specific_characteristics = ?,
            amenities = ?, internal_docs_urls = ?, property_source = ?, private_notes = ?,
            owner_id = ?, agent_id = ?, colleague_id = ?, is_published = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&draft.name)
    .bind(&draft.address)
    .bind(&draft.locality)
    .bind(&draft.neighbourhood)
    .bind(&draft.description)
    .bind(&draft.property_type)
    .bind(&draft.subtype)
    .bind(&draft.category)
    .bind(draft.price)
    .bind(&draft.currency)
    .bind(draft.total_surface)
    .bind(draft.covered_surface)
    .bind(draft.latitude)
    .bind(draft.longitude)
    .bind(serde_json::to_string(&draft.images)?)
    .bind(&draft.video_url)
    .bind(&draft.pdf_url)
    .bind(serde_json::to_string(&draft.specific_characteristics)?)
    .bind(serde_json::to_string(&draft.amenities)?)
    .bind(serde_json::to_string(&draft.internal_docs_urls)?)
    .bind(&draft.property_source)
    .bind(&draft.private_notes)
    .bind(draft.owner_id)
    .bind(draft.agent_id)
    .bind(draft.colleague_id)
    .bind(draft.is_published)
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a property row
pub async fn delete_row(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM properties WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Load one property by id
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Property>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM properties WHERE id = ?",
        ALL_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_property).transpose()
}

/// Load all records (admin listing)
pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Property>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM properties ORDER BY created_at DESC, id DESC",
        ALL_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows_to_properties(rows)
}

/// Rows with both coordinates set, for the map view
pub async fn find_for_map(pool: &SqlitePool) -> Result<Vec<Property>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM properties WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
         ORDER BY created_at DESC, id DESC",
        ALL_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows_to_properties(rows)
}

/// Public search filter
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Free text matched against locality, neighbourhood and address
    pub q: Option<String>,
    pub category: Option<String>,
    pub property_type: Option<String>,
}

/// Published records matching the public search filter
pub async fn find_published(pool: &SqlitePool, filter: &SearchFilter) -> Result<Vec<Property>> {
    let mut sql = format!(
        "SELECT {} FROM properties WHERE is_published = 1",
        ALL_COLUMNS
    );

    if filter.q.is_some() {
        sql.push_str(
            " AND (locality LIKE '%' || ? || '%' \
             OR neighbourhood LIKE '%' || ? || '%' \
             OR address LIKE '%' || ? || '%')",
        );
    }
    if filter.category.is_some() {
        sql.push_str(" AND category = ?");
    }
    if filter.property_type.is_some() {
        sql.push_str(" AND property_type = ?");
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut query = sqlx::query(&sql);
    if let Some(q) = &filter.q {
        query = query.bind(q).bind(q).bind(q);
    }
    if let Some(category) = &filter.category {
        query = query.bind(category);
    }
    if let Some(property_type) = &filter.property_type {
        query = query.bind(property_type);
    }

    rows_to_properties(query.fetch_all(pool).await?)
}

/// Columns exposed through the public picker endpoints
///
/// A closed enum so the column name is never interpolated from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerField {
    Locality,
    Category,
    Type,
    Subtype,
}

impl PickerField {
    fn column(self) -> &'static str {
        match self {
            PickerField::Locality => "locality",
            PickerField::Category => "category",
            PickerField::Type => "property_type",
            PickerField::Subtype => "subtype",
        }
    }
}

/// Distinct non-empty values of a picker column, published records only
pub async fn distinct_values(pool: &SqlitePool, field: PickerField) -> Result<Vec<String>> {
    let column = field.column();
    let sql = format!(
        "SELECT DISTINCT {col} FROM properties \
         WHERE is_published = 1 AND {col} IS NOT NULL AND TRIM({col}) != '' \
         ORDER BY {col} ASC",
        col = column
    );

    let rows = sqlx::query_scalar::<_, String>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Distinct subtypes, optionally narrowed to one parent type
pub async fn distinct_subtypes(pool: &SqlitePool, parent_type: Option<&str>) -> Result<Vec<String>> {
    let mut sql = String::from(
        "SELECT DISTINCT subtype FROM properties \
         WHERE is_published = 1 AND subtype IS NOT NULL AND TRIM(subtype) != ''",
    );
    if parent_type.is_some() {
        sql.push_str(" AND property_type = ?");
    }
    sql.push_str(" ORDER BY subtype ASC");

    let mut query = sqlx::query_scalar::<_, String>(&sql);
    if let Some(parent) = parent_type {
        query = query.bind(parent);
    }

    Ok(query.fetch_all(pool).await?)
}

/// Flip the publication flag; None when the record does not exist
pub async fn set_published(pool: &SqlitePool, id: i64, published: bool) -> Result<Option<bool>> {
    let result = sqlx::query("UPDATE properties SET is_published = ?, updated_at = ? WHERE id = ?")
        .bind(published)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        Ok(None)
    } else {
        Ok(Some(published))
    }
}

/// Locality predicate for the relaxation cascade
///
/// A single value matches as a case-insensitive substring; a list matches
/// any of its values exactly (case-insensitive).
#[derive(Debug, Clone, PartialEq)]
pub enum LocalityFilter {
    One(String),
    Many(Vec<String>),
}

/// One tier's bound predicates, already narrowed to the filters it uses
#[derive(Debug, Clone, Default)]
pub struct TierQuery<'a> {
    pub category: Option<&'a str>,
    pub property_type: Option<&'a str>,
    pub locality: Option<&'a LocalityFilter>,
}

/// Published records matching one relaxation tier, newest-first
pub async fn find_published_tier(
    pool: &SqlitePool,
    tier: &TierQuery<'_>,
    limit: i64,
) -> Result<Vec<Property>> {
    let mut sql = format!(
        "SELECT {} FROM properties WHERE is_published = 1",
        ALL_COLUMNS
    );

    if tier.category.is_some() {
        sql.push_str(" AND LOWER(category) = LOWER(?)");
    }
    if tier.property_type.is_some() {
        sql.push_str(" AND LOWER(property_type) = LOWER(?)");
    }
    match tier.locality {
        Some(LocalityFilter::One(_)) => {
            sql.push_str(" AND LOWER(locality) LIKE '%' || LOWER(?) || '%'");
        }
        Some(LocalityFilter::Many(values)) if !values.is_empty() => {
            let clauses = vec!["LOWER(locality) = LOWER(?)"; values.len()];
            sql.push_str(&format!(" AND ({})", clauses.join(" OR ")));
        }
        _ => {}
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");

    let mut query = sqlx::query(&sql);
    if let Some(category) = tier.category {
        query = query.bind(category);
    }
    if let Some(property_type) = tier.property_type {
        query = query.bind(property_type);
    }
    match tier.locality {
        Some(LocalityFilter::One(value)) => {
            query = query.bind(value);
        }
        Some(LocalityFilter::Many(values)) => {
            for value in values {
                query = query.bind(value);
            }
        }
        None => {}
    }
    query = query.bind(limit);

    rows_to_properties(query.fetch_all(pool).await?)
}

/// Published records of one type, excluding the given ids, newest-first
///
/// With `locality` set this is the "same type, same locality" phase of the
/// similar-listings fill; without it, the "same type anywhere" phase.
pub async fn find_similar_phase(
    pool: &SqlitePool,
    property_type: &str,
    locality: Option<&str>,
    exclude_ids: &[i64],
    limit: i64,
) -> Result<Vec<Property>> {
    let mut sql = format!(
        "SELECT {} FROM properties WHERE is_published = 1 AND property_type = ?",
        ALL_COLUMNS
    );

    if locality.is_some() {
        sql.push_str(" AND locality = ?");
    }
    if !exclude_ids.is_empty() {
        let placeholders = vec!["?"; exclude_ids.len()];
        sql.push_str(&format!(" AND id NOT IN ({})", placeholders.join(", ")));
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");

    let mut query = sqlx::query(&sql).bind(property_type);
    if let Some(locality) = locality {
        query = query.bind(locality);
    }
    for id in exclude_ids {
        query = query.bind(id);
    }
    query = query.bind(limit);

    rows_to_properties(query.fetch_all(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn draft(name: &str, category: &str, property_type: &str, locality: &str) -> PropertyDraft {
        PropertyDraft {
            name: name.to_string(),
            address: "742 Evergreen Terrace".to_string(),
            locality: locality.to_string(),
            neighbourhood: None,
            description: "Test listing".to_string(),
            property_type: property_type.to_string(),
            subtype: "house".to_string(),
            category: category.to_string(),
            price: Some(120_000.0),
            currency: "USD".to_string(),
            total_surface: Some(250.0),
            covered_surface: Some(180.0),
            latitude: None,
            longitude: None,
            images: vec!["/uploads/front.webp".to_string()],
            video_url: None,
            pdf_url: None,
            specific_characteristics: json!({}),
            amenities: vec![],
            internal_docs_urls: vec![],
            property_source: "propia".to_string(),
            private_notes: None,
            owner_id: None,
            agent_id: None,
            colleague_id: None,
            is_published: true,
        }
    }

    #[tokio::test]
    async fn insert_and_find_round_trip() {
        let pool = test_pool().await;
        let id = insert(&pool, &draft("Casa Centro", "sale", "house", "Springfield"))
            .await
            .unwrap();

        let loaded = find_by_id(&pool, id).await.unwrap().expect("row exists");
        assert_eq!(loaded.name, "Casa Centro");
        assert_eq!(loaded.images, vec!["/uploads/front.webp"]);
        assert_eq!(loaded.currency, "USD");
        assert!(loaded.is_published);
        assert!(loaded.pdf_url.is_none());
    }

    #[tokio::test]
    async fn find_by_id_missing_is_none() {
        let pool = test_pool().await;
        assert!(find_by_id(&pool, 9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_overwrites_images_and_document() {
        let pool = test_pool().await;
        let id = insert(&pool, &draft("Casa", "sale", "house", "Springfield"))
            .await
            .unwrap();

        let mut changed = draft("Casa", "sale", "house", "Springfield");
        changed.images = vec!["/uploads/b.webp".to_string(), "/uploads/a.webp".to_string()];
        changed.pdf_url = Some("/uploads/brochure.pdf".to_string());
        update(&pool, id, &changed).await.unwrap();

        let loaded = find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(loaded.images, vec!["/uploads/b.webp", "/uploads/a.webp"]);
        assert_eq!(loaded.pdf_url.as_deref(), Some("/uploads/brochure.pdf"));
    }

    #[tokio::test]
    async fn search_matches_locality_substring_and_filters() {
        let pool = test_pool().await;
        insert(&pool, &draft("A", "sale", "house", "Springfield"))
            .await
            .unwrap();
        insert(&pool, &draft("B", "rent", "loft", "Riverside"))
            .await
            .unwrap();
        let mut unpublished = draft("C", "sale", "house", "Springfield");
        unpublished.is_published = false;
        insert(&pool, &unpublished).await.unwrap();

        let results = find_published(
            &pool,
            &SearchFilter {
                q: Some("spring".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "A");

        let results = find_published(
            &pool,
            &SearchFilter {
                category: Some("rent".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "B");
    }

    #[tokio::test]
    async fn picker_values_are_distinct_sorted_published_only() {
        let pool = test_pool().await;
        insert(&pool, &draft("A", "sale", "house", "Springfield"))
            .await
            .unwrap();
        insert(&pool, &draft("B", "sale", "loft", "Riverside"))
            .await
            .unwrap();
        insert(&pool, &draft("C", "rent", "house", "Riverside"))
            .await
            .unwrap();
        let mut hidden = draft("D", "sale", "house", "Shelbyville");
        hidden.is_published = false;
        insert(&pool, &hidden).await.unwrap();

        let localities = distinct_values(&pool, PickerField::Locality).await.unwrap();
        assert_eq!(localities, vec!["Riverside", "Springfield"]);

        let types = distinct_values(&pool, PickerField::Type).await.unwrap();
        assert_eq!(types, vec!["house", "loft"]);
    }

    #[tokio::test]
    async fn subtypes_narrow_by_parent_type() {
        let pool = test_pool().await;
        let mut a = draft("A", "sale", "residential", "Springfield");
        a.subtype = "house".to_string();
        insert(&pool, &a).await.unwrap();
        let mut b = draft("B", "sale", "commercial", "Springfield");
        b.subtype = "office".to_string();
        insert(&pool, &b).await.unwrap();

        let all = distinct_subtypes(&pool, None).await.unwrap();
        assert_eq!(all, vec!["house", "office"]);

        let narrowed = distinct_subtypes(&pool, Some("commercial")).await.unwrap();
        assert_eq!(narrowed, vec!["office"]);
    }

    #[tokio::test]
    async fn set_published_reports_missing_rows() {
        let pool = test_pool().await;
        let id = insert(&pool, &draft("A", "sale", "house", "Springfield"))
            .await
            .unwrap();

        assert_eq!(set_published(&pool, id, false).await.unwrap(), Some(false));
        assert!(!find_by_id(&pool, id).await.unwrap().unwrap().is_published);
        assert_eq!(set_published(&pool, 9999, true).await.unwrap(), None);
    }

    #[tokio::test]
    async fn map_rows_require_coordinates() {
        let pool = test_pool().await;
        let mut located = draft("A", "sale", "house", "Springfield");
        located.latitude = Some(-34.6);
        located.longitude = Some(-58.4);
        insert(&pool, &located).await.unwrap();
        insert(&pool, &draft("B", "sale", "house", "Springfield"))
            .await
            .unwrap();

        let rows = find_for_map(&pool).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "A");
    }
}
