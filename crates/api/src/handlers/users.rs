//! Handlers for users.
//!
//! Anonymous visitors register through `POST /users`; the password never
//! appears in any response.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use devsync_core::types::DbId;
use serde_json::{Map, Value};

use crate::controller::params::Params;
use crate::controller::user;
use crate::error::AppResult;
use crate::middleware::auth::MaybeActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /users
pub async fn list_users(
    actor: MaybeActor,
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> AppResult<impl IntoResponse> {
    let listing = user::list(&state.controllers.user, &state.store, actor.as_ref(), &params).await?;
    Ok(Json(listing))
}

/// GET /users/{id}
pub async fn get_user(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .user
        .get_by_id(&state.store, actor.as_ref(), id)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// POST /users
pub async fn create_user(
    actor: MaybeActor,
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let data = user::create(&state.controllers.user, &state.store, actor.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PATCH /users/{id}
pub async fn update_user(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let data = user::update(&state.controllers.user, &state.store, actor.as_ref(), id, body).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /users/{id} (admin only)
pub async fn delete_user(
    actor: MaybeActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let data = state
        .controllers
        .user
        .delete(&state.store, actor.as_ref(), id)
        .await?;
    tracing::info!(user_id = id, "User deleted");
    Ok(Json(DataResponse { data }))
}
