//! Route definitions for posts and everything nested under a post.
//!
//! Mounted at `/posts` by `api_routes()`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{categories, comments, favorites, likes, posts};
use crate::state::AppState;

/// ```text
/// GET    /                       -> list_posts
/// POST   /                       -> create_post
/// GET    /{id}                   -> get_post
/// PATCH  /{id}                   -> update_post
/// DELETE /{id}                   -> delete_post
/// GET    /{id}/comments          -> list_post_comments
/// POST   /{id}/comments          -> create_post_comment
/// GET    /{id}/categories        -> list_post_categories
/// GET    /{id}/like              -> list_post_likes
/// POST   /{id}/like              -> like_post
/// DELETE /{id}/like/{like_id}    -> unlike_post
/// POST   /{id}/favorite          -> add_favorite
/// DELETE /{id}/favorite          -> remove_favorite
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::list_posts).post(posts::create_post))
        .route(
            "/{id}",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/{id}/comments",
            get(comments::list_post_comments).post(comments::create_post_comment),
        )
        .route("/{id}/categories", get(categories::list_post_categories))
        .route("/{id}/like", get(likes::list_post_likes).post(likes::like_post))
        .route("/{id}/like/{like_id}", delete(likes::unlike_post))
        .route(
            "/{id}/favorite",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        )
}
