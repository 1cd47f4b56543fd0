//! Contact lookup endpoints (owners, agents, colleagues)

use crate::db::contacts::{self, Agent, Colleague, Owner};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

/// GET /api/owners
pub async fn list_owners(State(state): State<AppState>) -> ApiResult<Json<Vec<Owner>>> {
    Ok(Json(contacts::list_owners(&state.db).await?))
}

/// GET /api/owners/:id
pub async fn get_owner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Owner>> {
    match contacts::find_owner(&state.db, id).await? {
        Some(owner) => Ok(Json(owner)),
        None => Err(ApiError::NotFound(format!("Owner {} does not exist", id))),
    }
}

/// GET /api/agents
pub async fn list_agents(State(state): State<AppState>) -> ApiResult<Json<Vec<Agent>>> {
    Ok(Json(contacts::list_agents(&state.db).await?))
}

/// GET /api/agents/:id
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Agent>> {
    match contacts::find_agent(&state.db, id).await? {
        Some(agent) => Ok(Json(agent)),
        None => Err(ApiError::NotFound(format!("Agent {} does not exist", id))),
    }
}

/// GET /api/colleagues
pub async fn list_colleagues(State(state): State<AppState>) -> ApiResult<Json<Vec<Colleague>>> {
    Ok(Json(contacts::list_colleagues(&state.db).await?))
}

/// GET /api/colleagues/:id
pub async fn get_colleague(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Colleague>> {
    match contacts::find_colleague(&state.db, id).await? {
        Some(colleague) => Ok(Json(colleague)),
        None => Err(ApiError::NotFound(format!(
            "Colleague {} does not exist",
            id
        ))),
    }
}

/// Build contact lookup routes
pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/api/owners", get(list_owners))
        .route("/api/owners/:id", get(get_owner))
        .route("/api/agents", get(list_agents))
        .route("/api/agents/:id", get(get_agent))
        .route("/api/colleagues", get(list_colleagues))
        .route("/api/colleagues/:id", get(get_colleague))
}
