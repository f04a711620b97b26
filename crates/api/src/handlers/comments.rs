//! Handlers for comments, replies and best-comment selection.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use devsync_core::types::DbId;
use serde_json::{Map, Value};

use crate::controller::comment;
use crate::controller::params::Params;
use crate::error::AppResult;
use crate::middleware::auth::MaybeActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /comments
pub async fn list_comments(
    actor: MaybeActor,
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    let listing =
        comment::list(&state.controllers.comment, &state.store, actor.as_ref(), &params).await?;
    Ok(Json(listing))
}

/// GET /comments/{id}
pub async fn get_comment(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .comment
        .get_by_id(&state.store, actor.as_ref(), id)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// POST /comments
pub async fn create_comment(
    actor: MaybeActor,
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .comment
        .create(&state.store, actor.as_ref(), body)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PATCH /comments/{id}
pub async fn update_comment(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .comment
        .update(&state.store, actor.as_ref(), id, body)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /comments/{id}
pub async fn delete_comment(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .comment
        .delete(&state.store, actor.as_ref(), id)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// PATCH /comments/{id}/setBest
///
/// Toggles the comment's `isBest` flag. Only the author of the post may do
/// this; anyone else gets 403.
pub async fn set_best_comment(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data =
        comment::set_best(&state.controllers.comment, &state.store, actor.as_ref(), id).await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// Nested under posts and comments
// ---------------------------------------------------------------------------

/// GET /posts/{postId}/comments
pub async fn list_post_comments(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    let listing = comment::list_of_post(
        &state.controllers.comment,
        &state.store,
        actor.as_ref(),
        post_id,
        &params,
    )
    .await?;
    Ok(Json(listing))
}

/// POST /posts/{postId}/comments
pub async fn create_post_comment(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let data = comment::create_for_post(
        &state.controllers.comment,
        &state.store,
        actor.as_ref(),
        post_id,
        body,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /comments/{commentId}/comments
pub async fn list_replies(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    let listing = comment::list_replies(
        &state.controllers.comment,
        &state.store,
        actor.as_ref(),
        comment_id,
        &params,
    )
    .await?;
    Ok(Json(listing))
}

/// POST /comments/{commentId}/comments
pub async fn create_reply(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let data = comment::reply(
        &state.controllers.comment,
        &state.store,
        actor.as_ref(),
        comment_id,
        body,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}
