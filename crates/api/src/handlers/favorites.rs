//! Handlers for post favorites.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use devsync_core::types::DbId;

use crate::controller::favorite;
use crate::error::AppResult;
use crate::middleware::auth::MaybeActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /posts/{postId}/favorite
pub async fn add_favorite(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data =
        favorite::add(&state.controllers.favorite, &state.store, actor.as_ref(), post_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// DELETE /posts/{postId}/favorite
pub async fn remove_favorite(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data =
        favorite::remove(&state.controllers.favorite, &state.store, actor.as_ref(), post_id).await?;
    Ok(Json(DataResponse { data }))
}
