//! The store boundary.
//!
//! Everything above this trait speaks in structured [`Statement`]s. A store
//! executes them and reports rows, counts, generated ids or affected-row
//! counts. Each call is one statement: no store method holds a connection
//! across calls.

use std::sync::Arc;

use async_trait::async_trait;
use devsync_core::types::DbId;

use crate::error::StoreError;
use crate::statement::{Count, Insert, Row, Select, Statement};

#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_rows(&self, select: &Select) -> Result<Vec<Row>, StoreError>;

    async fn fetch_count(&self, count: &Count) -> Result<i64, StoreError>;

    /// Insert one row and return its generated id.
    async fn insert(&self, insert: &Insert) -> Result<DbId, StoreError>;

    /// Run an update or delete and return the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError>;

    /// Check the store answers at all.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Shared handle passed into every [`crate::module::Module`].
pub type StoreHandle = Arc<dyn Store>;
