//! Handlers for posts and the post listings nested under users and
//! categories.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use devsync_core::types::DbId;
use serde_json::{Map, Value};

use crate::controller::params::Params;
use crate::controller::post;
use crate::error::AppResult;
use crate::middleware::auth::MaybeActor;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /posts
// ---------------------------------------------------------------------------

/// List visible posts, paginated.
///
/// Query: `id`, `status`, `isTop`, `categories`, `createdAtFrom`,
/// `createdAtTo`, `createdById`, `sortBy`, `page`.
pub async fn list_posts(
    actor: MaybeActor,
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    let listing = post::list(&state.controllers.post, &state.store, actor.as_ref(), &params).await?;
    Ok(Json(listing))
}

// ---------------------------------------------------------------------------
// GET /posts/{id}
// ---------------------------------------------------------------------------

pub async fn get_post(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .post
        .get_by_id(&state.store, actor.as_ref(), id)
        .await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// POST /posts
// ---------------------------------------------------------------------------

/// Create a post. A `categories` field (`"1,2"` or `[1, 2]`) links it to
/// those categories.
pub async fn create_post(
    actor: MaybeActor,
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let data = post::create(&state.controllers.post, &state.store, actor.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

// ---------------------------------------------------------------------------
// PATCH /posts/{id}
// ---------------------------------------------------------------------------

pub async fn update_post(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let data = post::update(&state.controllers.post, &state.store, actor.as_ref(), id, body).await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// DELETE /posts/{id}
// ---------------------------------------------------------------------------

pub async fn delete_post(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = post::delete(&state.controllers.post, &state.store, actor.as_ref(), id).await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// Nested listings
// ---------------------------------------------------------------------------

/// GET /categories/{categoryId}/posts
pub async fn list_category_posts(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    let listing = post::list_by_category(
        &state.controllers.post,
        &state.store,
        actor.as_ref(),
        category_id,
        &params,
    )
    .await?;
    Ok(Json(listing))
}

/// GET /users/{userId}/posts
pub async fn list_user_posts(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    let listing =
        post::list_by_user(&state.controllers.post, &state.store, actor.as_ref(), user_id, &params)
            .await?;
    Ok(Json(listing))
}

/// GET /users/{userId}/favorites
pub async fn list_user_favorites(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    let listing = post::list_favorites(
        &state.controllers.post,
        &state.store,
        actor.as_ref(),
        user_id,
        &params,
    )
    .await?;
    Ok(Json(listing))
}
