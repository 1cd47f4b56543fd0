//! Admin property endpoints: the record editor's API
//!
//! Create and update accept multipart forms (text fields plus the `images`
//! and `pdf` file fields). Not-found outcomes surface as 404.

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{Property, PropertySubmission};
use crate::{api::uploads, AppState};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// POST /api/properties
pub async fn create_property(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Property>)> {
    let form = uploads::read_form(multipart, state.sync.media().store()).await?;
    let data = PropertySubmission::from_form_fields(form.fields);

    let created = state.sync.create(data, form.files).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/properties/:id
pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<Json<Property>> {
    let form = uploads::read_form(multipart, state.sync.media().store()).await?;
    let data = PropertySubmission::from_form_fields(form.fields);

    match state.sync.update(id, data, form.files).await? {
        Some(updated) => Ok(Json(updated)),
        None => Err(ApiError::NotFound(format!("Property {} does not exist", id))),
    }
}

/// DELETE /api/properties/:id
pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.sync.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Property {} does not exist", id)))
    }
}

/// GET /api/properties
pub async fn list_properties(State(state): State<AppState>) -> ApiResult<Json<Vec<Property>>> {
    Ok(Json(db::properties::find_all(&state.db).await?))
}

/// GET /api/properties/:id
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Property>> {
    match db::properties::find_by_id(&state.db, id).await? {
        Some(property) => Ok(Json(property)),
        None => Err(ApiError::NotFound(format!("Property {} does not exist", id))),
    }
}

/// GET /api/properties/map — records with coordinates, for the map view
pub async fn map_properties(State(state): State<AppState>) -> ApiResult<Json<Vec<Property>>> {
    Ok(Json(db::properties::find_for_map(&state.db).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub is_published: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub new_status: bool,
}

/// PUT /api/properties/:id/publish
pub async fn set_published(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PublishRequest>,
) -> ApiResult<Json<PublishResponse>> {
    match db::properties::set_published(&state.db, id, payload.is_published).await? {
        Some(new_status) => Ok(Json(PublishResponse { new_status })),
        None => Err(ApiError::NotFound(format!("Property {} does not exist", id))),
    }
}

/// Build admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/properties",
            get(list_properties).post(create_property),
        )
        .route("/api/properties/map", get(map_properties))
        .route(
            "/api/properties/:id",
            get(get_property)
                .put(update_property)
                .delete(delete_property),
        )
        .route("/api/properties/:id/publish", put(set_published))
}
