//! Route definitions for categories.
//!
//! Mounted at `/categories` by `api_routes()`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{categories, posts};
use crate::state::AppState;

/// ```text
/// GET    /                 -> list_categories
/// POST   /                 -> create_category
/// GET    /{id}             -> get_category
/// PATCH  /{id}             -> update_category
/// DELETE /{id}             -> delete_category
/// GET    /{id}/posts       -> list_category_posts
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/{id}",
            get(categories::get_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/{id}/posts", get(posts::list_category_posts))
}
