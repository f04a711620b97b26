//! Axum handlers.
//!
//! Handlers stay thin: extract the actor, path, query and body, call the
//! entity controller, and wrap the result in the response envelope.
//! Create endpoints answer 201, everything else 200.

pub mod categories;
pub mod comments;
pub mod favorites;
pub mod likes;
pub mod posts;
pub mod users;
