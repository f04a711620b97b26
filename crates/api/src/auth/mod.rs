//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT access-token validation (and issuance for tooling).

pub mod jwt;
pub mod password;
