//! Public browse endpoints
//!
//! Everything here serves the published record set only. The suggestions
//! endpoint accepts `locality` more than once; repeating it switches the
//! locality predicate from substring match to exact-any match.

use crate::db;
use crate::db::properties::{LocalityFilter, PickerField, SearchFilter};
use crate::error::ApiResult;
use crate::models::Property;
use crate::services::SuggestionFilters;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
}

/// GET /api/public/properties — published records, optionally filtered
pub async fn search_properties(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Property>>> {
    let filter = SearchFilter {
        q: params.q,
        category: params.category,
        property_type: params.property_type,
    };
    Ok(Json(db::properties::find_published(&state.db, &filter).await?))
}

/// GET /api/public/suggestions
///
/// Raw key/value pairs instead of a struct so repeated `locality` keys
/// survive extraction.
pub async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Property>>> {
    let filters = suggestion_filters(params);
    Ok(Json(state.engine.suggest(&filters).await?))
}

fn suggestion_filters(params: Vec<(String, String)>) -> SuggestionFilters {
    let mut filters = SuggestionFilters::default();
    let mut localities = Vec::new();

    for (key, value) in params {
        match key.as_str() {
            "category" => filters.category = Some(value),
            "type" => filters.property_type = Some(value),
            "locality" => localities.push(value),
            _ => {}
        }
    }

    filters.locality = match localities.len() {
        0 => None,
        1 => localities.pop().map(LocalityFilter::One),
        _ => Some(LocalityFilter::Many(localities)),
    };
    filters
}

/// GET /api/public/properties/:id/similar
pub async fn similar_properties(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Property>>> {
    Ok(Json(state.engine.similar(id).await?))
}

/// GET /api/public/localities
pub async fn list_localities(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(
        db::properties::distinct_values(&state.db, PickerField::Locality).await?,
    ))
}

/// GET /api/public/categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(
        db::properties::distinct_values(&state.db, PickerField::Category).await?,
    ))
}

/// GET /api/public/types
pub async fn list_types(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(
        db::properties::distinct_values(&state.db, PickerField::Type).await?,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct SubtypeParams {
    #[serde(rename = "type")]
    pub property_type: Option<String>,
}

/// GET /api/public/subtypes — optionally narrowed to one parent type
pub async fn list_subtypes(
    State(state): State<AppState>,
    Query(params): Query<SubtypeParams>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(
        db::properties::distinct_subtypes(&state.db, params.property_type.as_deref()).await?,
    ))
}

/// Build public browse routes
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/public/properties", get(search_properties))
        .route("/api/public/suggestions", get(suggestions))
        .route("/api/public/properties/:id/similar", get(similar_properties))
        .route("/api/public/localities", get(list_localities))
        .route("/api/public/categories", get(list_categories))
        .route("/api/public/types", get(list_types))
        .route("/api/public/subtypes", get(list_subtypes))
}
