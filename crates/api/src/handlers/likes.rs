//! Handlers for likes on posts and comments.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use devsync_core::types::DbId;
use devsync_db::entities::LikeTarget;
use devsync_db::Record;
use serde_json::{Map, Value};

use crate::controller::like;
use crate::controller::params::Params;
use crate::error::AppResult;
use crate::middleware::auth::MaybeActor;
use crate::response::{DataResponse, Listing};
use crate::state::AppState;

async fn list_for(
    state: &AppState,
    actor: &MaybeActor,
    target: LikeTarget,
    params: &Params,
) -> AppResult<Json<Listing>> {
    let listing =
        like::list_for_target(&state.controllers.like, &state.store, actor.as_ref(), target, params)
            .await?;
    Ok(Json(listing))
}

async fn upsert_for(
    state: &AppState,
    actor: &MaybeActor,
    target: LikeTarget,
    body: Map<String, Value>,
) -> AppResult<(StatusCode, Json<DataResponse<Record>>)> {
    let data = like::upsert(&state.controllers.like, &state.store, actor.as_ref(), target, body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

async fn delete_for(
    state: &AppState,
    actor: &MaybeActor,
    target: LikeTarget,
    id: DbId,
) -> AppResult<Json<DataResponse<Record>>> {
    let data =
        like::delete_for_target(&state.controllers.like, &state.store, actor.as_ref(), target, id)
            .await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// Post likes
// ---------------------------------------------------------------------------

/// GET /posts/{postId}/like
pub async fn list_post_likes(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    list_for(&state, &actor, LikeTarget::Post(post_id), &params).await
}

/// POST /posts/{postId}/like
///
/// Body: `{"type": "like" | "dislike"}`. Voting again replaces the
/// previous vote.
pub async fn like_post(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    upsert_for(&state, &actor, LikeTarget::Post(post_id), body).await
}

/// DELETE /posts/{postId}/like/{id}
pub async fn unlike_post(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path((post_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    delete_for(&state, &actor, LikeTarget::Post(post_id), id).await
}

// ---------------------------------------------------------------------------
// Comment likes
// ---------------------------------------------------------------------------

/// GET /comments/{commentId}/like
pub async fn list_comment_likes(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    list_for(&state, &actor, LikeTarget::Comment(comment_id), &params).await
}

/// POST /comments/{commentId}/like
pub async fn like_comment(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    upsert_for(&state, &actor, LikeTarget::Comment(comment_id), body).await
}

/// DELETE /comments/{commentId}/like/{id}
pub async fn unlike_comment(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path((comment_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    delete_for(&state, &actor, LikeTarget::Comment(comment_id), id).await
}
