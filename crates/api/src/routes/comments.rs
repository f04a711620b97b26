//! Route definitions for comments, replies and comment likes.
//!
//! Mounted at `/comments` by `api_routes()`.

use axum::routing::{delete, get, patch};
use axum::Router;

use crate::handlers::{comments, likes};
use crate::state::AppState;

/// ```text
/// GET    /                       -> list_comments
/// POST   /                       -> create_comment
/// GET    /{id}                   -> get_comment
/// PATCH  /{id}                   -> update_comment
/// DELETE /{id}                   -> delete_comment
/// PATCH  /{id}/setBest           -> set_best_comment
/// GET    /{id}/comments          -> list_replies
/// POST   /{id}/comments          -> create_reply
/// GET    /{id}/like              -> list_comment_likes
/// POST   /{id}/like              -> like_comment
/// DELETE /{id}/like/{like_id}    -> unlike_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/{id}",
            get(comments::get_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/{id}/setBest", patch(comments::set_best_comment))
        .route(
            "/{id}/comments",
            get(comments::list_replies).post(comments::create_reply),
        )
        .route(
            "/{id}/like",
            get(likes::list_comment_likes).post(likes::like_comment),
        )
        .route("/{id}/like/{like_id}", delete(likes::unlike_comment))
}
