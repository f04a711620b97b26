//! Request extractors.
//!
//! - [`auth::MaybeActor`] -- the acting user from a JWT Bearer token, or
//!   anonymous when no `Authorization` header is sent.

pub mod auth;
