//! Route definitions for users.
//!
//! Mounted at `/users` by `api_routes()`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{posts, users};
use crate::state::AppState;

/// ```text
/// GET    /                 -> list_users
/// POST   /                 -> create_user
/// GET    /{id}             -> get_user
/// PATCH  /{id}             -> update_user
/// DELETE /{id}             -> delete_user
/// GET    /{id}/posts       -> list_user_posts
/// GET    /{id}/favorites   -> list_user_favorites
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/{id}/posts", get(posts::list_user_posts))
        .route("/{id}/favorites", get(posts::list_user_favorites))
}
