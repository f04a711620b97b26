//! Handlers for categories.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use devsync_core::types::DbId;
use serde_json::{Map, Value};

use crate::controller::category;
use crate::controller::params::Params;
use crate::error::AppResult;
use crate::middleware::auth::MaybeActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /categories
pub async fn list_categories(
    actor: MaybeActor,
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    let listing =
        category::list(&state.controllers.category, &state.store, actor.as_ref(), &params).await?;
    Ok(Json(listing))
}

/// GET /categories/{id}
pub async fn get_category(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .category
        .get_by_id(&state.store, actor.as_ref(), id)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// POST /categories (admin only)
pub async fn create_category(
    actor: MaybeActor,
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .category
        .create(&state.store, actor.as_ref(), body)
        .await?;
    tracing::info!(category_id = data.id(), "Category created");
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PATCH /categories/{id} (admin only)
pub async fn update_category(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .category
        .update(&state.store, actor.as_ref(), id, body)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /categories/{id} (admin only)
pub async fn delete_category(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .category
        .delete(&state.store, actor.as_ref(), id)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// GET /posts/{postId}/categories
pub async fn list_post_categories(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data =
        category::list_of_post(&state.controllers.category, &state.store, actor.as_ref(), post_id)
            .await?;
    Ok(Json(DataResponse { data }))
}
