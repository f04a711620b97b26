pub mod categories;
pub mod comments;
pub mod health;
pub mod posts;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users                                  list, register
/// /users/{id}                             get, update, delete
/// /users/{id}/posts                       posts created by the user
/// /users/{id}/favorites                   posts the user marked as favorite
///
/// /categories                             list, create
/// /categories/{id}                        get, update, delete
/// /categories/{id}/posts                  posts linked to the category
///
/// /posts                                  list, create
/// /posts/{id}                             get, update, delete
/// /posts/{id}/comments                    top-level comments, add comment
/// /posts/{id}/categories                  linked categories
/// /posts/{id}/like                        list likes, like/dislike
/// /posts/{id}/like/{like_id}              remove like
/// /posts/{id}/favorite                    add, remove favorite
///
/// /comments                               list, create
/// /comments/{id}                          get, update, delete
/// /comments/{id}/setBest                  toggle best comment (post author)
/// /comments/{id}/comments                 replies, reply
/// /comments/{id}/like                     list likes, like/dislike
/// /comments/{id}/like/{like_id}           remove like
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/categories", categories::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
}
