//! Pure domain logic for the DevSync back-end.
//!
//! Nothing in this crate performs I/O: it holds the filter expression tree,
//! the role-scoped access rules that resolve into criteria, pagination math,
//! sort keys and field validators. The `db` and `api` crates build on it.

pub mod access;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod roles;
pub mod sort;
pub mod types;
pub mod validation;
