//! Shared response envelope types for API handlers.
//!
//! Single-entity responses use a `{ "data": ... }` envelope; list responses
//! add the page window: `{ "pagination": {...} | null, "data": [...] }`.

use devsync_core::pagination::Pagination;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// A record rendered for output.
pub type Projection = IndexMap<String, Value>;

/// `{ "pagination": ..., "data": [...] }` list envelope. `pagination` is
/// `null` for listings that are not paginated.
#[derive(Debug, Serialize)]
pub struct Listing {
    pub pagination: Option<Pagination>,
    pub data: Vec<Projection>,
}
