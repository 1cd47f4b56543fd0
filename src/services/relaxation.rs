//! Query relaxation for browsing and similar listings
//!
//! Suggestions run through an ordered cascade of progressively looser
//! filter tiers; the first tier that yields at least one published record
//! wins. Tiers are data, not control flow: adding or reordering one is a
//! change to the `TIERS` table, not to the evaluation loop.

use crate::db;
use crate::db::properties::{LocalityFilter, TierQuery};
use crate::error::Result;
use crate::models::Property;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::debug;

/// Result cap for both suggestions and similar listings
pub const RESULT_LIMIT: i64 = 3;

/// Client-supplied suggestion filters; empty strings count as absent
#[derive(Debug, Clone, Default)]
pub struct SuggestionFilters {
    pub category: Option<String>,
    pub property_type: Option<String>,
    pub locality: Option<LocalityFilter>,
}

impl SuggestionFilters {
    fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|s| !s.trim().is_empty())
    }

    fn property_type(&self) -> Option<&str> {
        self.property_type
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    fn locality(&self) -> Option<&LocalityFilter> {
        match &self.locality {
            Some(LocalityFilter::One(value)) if !value.trim().is_empty() => {
                self.locality.as_ref()
            }
            Some(LocalityFilter::Many(values))
                if values.iter().any(|v| !v.trim().is_empty()) =>
            {
                self.locality.as_ref()
            }
            _ => None,
        }
    }
}

/// One tier of the cascade: which filter inputs it binds
#[derive(Debug, Clone, Copy)]
struct Tier {
    category: bool,
    property_type: bool,
    locality: bool,
}

impl Tier {
    /// A tier only runs when every input it binds is present; the final
    /// unfiltered tier binds nothing and always runs.
    fn applicable(&self, filters: &SuggestionFilters) -> bool {
        (!self.category || filters.category().is_some())
            && (!self.property_type || filters.property_type().is_some())
            && (!self.locality || filters.locality().is_some())
    }

    fn query<'a>(&self, filters: &'a SuggestionFilters) -> TierQuery<'a> {
        TierQuery {
            category: if self.category { filters.category() } else { None },
            property_type: if self.property_type {
                filters.property_type()
            } else {
                None
            },
            locality: if self.locality { filters.locality() } else { None },
        }
    }
}

/// The cascade, strictest first. Evaluation short-circuits on the first
/// tier with results, so results always come from exactly one tier.
const TIERS: [Tier; 5] = [
    Tier { category: true, property_type: true, locality: true },
    Tier { category: true, property_type: false, locality: true },
    Tier { category: true, property_type: true, locality: false },
    Tier { category: true, property_type: false, locality: false },
    Tier { category: false, property_type: false, locality: false },
];

/// Suggested and similar listings over the published record set
#[derive(Debug, Clone)]
pub struct RelaxationEngine {
    db: SqlitePool,
}

impl RelaxationEngine {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Up to [`RESULT_LIMIT`] published records from the first non-empty
    /// tier, newest-first, deduplicated by id
    pub async fn suggest(&self, filters: &SuggestionFilters) -> Result<Vec<Property>> {
        for (index, tier) in TIERS.iter().enumerate() {
            if !tier.applicable(filters) {
                continue;
            }
            let rows =
                db::properties::find_published_tier(&self.db, &tier.query(filters), RESULT_LIMIT)
                    .await?;
            if !rows.is_empty() {
                debug!("Suggestion tier {} matched {} record(s)", index + 1, rows.len());
                return Ok(dedup_by_id(rows));
            }
        }
        Ok(Vec::new())
    }

    /// Up to [`RESULT_LIMIT`] published records similar to the reference
    ///
    /// Phase A matches type and locality exactly; phase B fills remaining
    /// slots with same-type records from anywhere else. The reference
    /// record never appears in its own results; a missing reference yields
    /// an empty result, not an error.
    pub async fn similar(&self, property_id: i64) -> Result<Vec<Property>> {
        let reference = match db::properties::find_by_id(&self.db, property_id).await? {
            Some(p) => p,
            None => return Ok(Vec::new()),
        };

        let mut results = db::properties::find_similar_phase(
            &self.db,
            &reference.property_type,
            Some(&reference.locality),
            &[property_id],
            RESULT_LIMIT,
        )
        .await?;

        if (results.len() as i64) < RESULT_LIMIT {
            let mut exclude: Vec<i64> = vec![property_id];
            exclude.extend(results.iter().map(|p| p.id));
            let needed = RESULT_LIMIT - results.len() as i64;

            let extra = db::properties::find_similar_phase(
                &self.db,
                &reference.property_type,
                None,
                &exclude,
                needed,
            )
            .await?;
            results.extend(extra);
        }

        Ok(results)
    }
}

/// Defense-in-depth: tiers are mutually exclusive by construction, but the
/// case-insensitive matching warrants an explicit id dedup.
fn dedup_by_id(rows: Vec<Property>) -> Vec<Property> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|p| seen.insert(p.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyDraft;
    use serde_json::json;

    async fn test_engine() -> (RelaxationEngine, SqlitePool) {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        (RelaxationEngine::new(pool.clone()), pool)
    }

    fn draft(name: &str, category: &str, property_type: &str, locality: &str) -> PropertyDraft {
        PropertyDraft {
            name: name.to_string(),
            address: "Calle Falsa 123".to_string(),
            locality: locality.to_string(),
            neighbourhood: None,
            description: "Listado de prueba".to_string(),
            property_type: property_type.to_string(),
            subtype: "generic".to_string(),
            category: category.to_string(),
            price: Some(100_000.0),
            currency: "USD".to_string(),
            total_surface: None,
            covered_surface: None,
            latitude: None,
            longitude: None,
            images: vec![],
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

    async fn seed(pool: &SqlitePool, d: &PropertyDraft) -> i64 {
        crate::db::properties::insert(pool, d).await.unwrap()
    }

    fn filters(category: &str, property_type: &str, locality: &str) -> SuggestionFilters {
        SuggestionFilters {
            category: Some(category.to_string()),
            property_type: Some(property_type.to_string()),
            locality: Some(LocalityFilter::One(locality.to_string())),
        }
    }

    #[tokio::test]
    async fn exact_tier_wins_when_it_matches() {
        let (engine, pool) = test_engine().await;
        seed(&pool, &draft("Exact", "sale", "house", "Springfield")).await;
        seed(&pool, &draft("OtherType", "sale", "loft", "Springfield")).await;

        let results = engine
            .suggest(&filters("sale", "house", "Springfield"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Exact");
    }

    #[tokio::test]
    async fn results_come_from_a_single_tier() {
        let (engine, pool) = test_engine().await;
        // One exact match and plenty of looser matches
        seed(&pool, &draft("Exact", "sale", "house", "Springfield")).await;
        seed(&pool, &draft("Loose1", "sale", "loft", "Riverside")).await;
        seed(&pool, &draft("Loose2", "sale", "loft", "Shelbyville")).await;

        let results = engine
            .suggest(&filters("sale", "house", "Springfield"))
            .await
            .unwrap();
        // Never a mix: only the exact-tier record comes back
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Exact");
    }

    #[tokio::test]
    async fn falls_back_to_category_only_tier() {
        let (engine, pool) = test_engine().await;
        // No "sale"+"house" anywhere, but two "sale" records exist
        seed(&pool, &draft("Older", "sale", "loft", "Riverside")).await;
        seed(&pool, &draft("Newer", "sale", "warehouse", "Shelbyville")).await;

        let results = engine
            .suggest(&filters("sale", "house", "Springfield"))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        // Newest first
        assert_eq!(results[0].name, "Newer");
        assert_eq!(results[1].name, "Older");
    }

    #[tokio::test]
    async fn type_dropped_before_locality() {
        let (engine, pool) = test_engine().await;
        // Tier 2 (category+locality) should win over tier 3 (category+type)
        seed(&pool, &draft("SameLocality", "sale", "loft", "Springfield")).await;
        seed(&pool, &draft("SameType", "sale", "house", "Riverside")).await;

        let results = engine
            .suggest(&filters("sale", "house", "Springfield"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "SameLocality");
    }

    #[tokio::test]
    async fn empty_filters_return_most_recent_published() {
        let (engine, pool) = test_engine().await;
        for i in 0..5 {
            seed(&pool, &draft(&format!("P{}", i), "sale", "house", "X")).await;
        }
        let mut hidden = draft("Hidden", "sale", "house", "X");
        hidden.is_published = false;
        seed(&pool, &hidden).await;

        let results = engine.suggest(&SuggestionFilters::default()).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].name, "P4");
        assert_eq!(results[1].name, "P3");
        assert_eq!(results[2].name, "P2");
    }

    #[tokio::test]
    async fn never_returns_unpublished_records() {
        let (engine, pool) = test_engine().await;
        let mut hidden = draft("Hidden", "sale", "house", "Springfield");
        hidden.is_published = false;
        seed(&pool, &hidden).await;

        let results = engine
            .suggest(&filters("sale", "house", "Springfield"))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn category_and_type_match_case_insensitively() {
        let (engine, pool) = test_engine().await;
        seed(&pool, &draft("Casa", "Sale", "House", "Springfield")).await;

        let results = engine
            .suggest(&filters("sale", "house", "springfield"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn locality_list_matches_any_value_exactly() {
        let (engine, pool) = test_engine().await;
        seed(&pool, &draft("A", "sale", "house", "Riverside")).await;
        seed(&pool, &draft("B", "sale", "house", "Springfield")).await;
        seed(&pool, &draft("C", "sale", "house", "Springfield North")).await;

        let results = engine
            .suggest(&SuggestionFilters {
                category: Some("sale".to_string()),
                property_type: Some("house".to_string()),
                locality: Some(LocalityFilter::Many(vec![
                    "springfield".to_string(),
                    "riverside".to_string(),
                ])),
            })
            .await
            .unwrap();

        // Exact (case-insensitive) list matching: "Springfield North" stays out
        let names: Vec<&str> = results.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"A"));
        assert!(names.contains(&"B"));
    }

    #[tokio::test]
    async fn blank_filter_values_count_as_absent() {
        let (engine, pool) = test_engine().await;
        seed(&pool, &draft("Any", "rent", "loft", "Riverside")).await;

        // All-blank filters skip straight to the unfiltered tier
        let results = engine
            .suggest(&SuggestionFilters {
                category: Some("  ".to_string()),
                property_type: Some(String::new()),
                locality: Some(LocalityFilter::One(String::new())),
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn similar_fills_from_same_type_elsewhere() {
        let (engine, pool) = test_engine().await;
        let reference = seed(&pool, &draft("Ref", "sale", "loft", "Riverside")).await;
        // One same-type same-locality match
        seed(&pool, &draft("Local", "sale", "loft", "Riverside")).await;
        // Five same-type matches in other localities
        for i in 0..5 {
            seed(&pool, &draft(&format!("Away{}", i), "sale", "loft", "Shelbyville")).await;
        }

        let results = engine.similar(reference).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].name, "Local");
        // Fill slots take the newest of the away records
        assert_eq!(results[1].name, "Away4");
        assert_eq!(results[2].name, "Away3");

        // Never the reference, never a duplicate id
        let mut ids: Vec<i64> = results.iter().map(|p| p.id).collect();
        assert!(!ids.contains(&reference));
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn similar_excludes_unpublished_and_reference() {
        let (engine, pool) = test_engine().await;
        let reference = seed(&pool, &draft("Ref", "sale", "loft", "Riverside")).await;
        let mut hidden = draft("Hidden", "sale", "loft", "Riverside");
        hidden.is_published = false;
        seed(&pool, &hidden).await;

        let results = engine.similar(reference).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn similar_for_missing_reference_is_empty() {
        let (engine, _pool) = test_engine().await;
        let results = engine.similar(9999).await.unwrap();
        assert!(results.is_empty());
    }
}
