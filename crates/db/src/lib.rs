//! Persistence for DevSync: the store boundary, the generic [`Module`] and
//! [`Record`] machinery, and the concrete entity types.

pub mod descriptor;
pub mod entities;
pub mod error;
pub mod memory;
pub mod module;
pub mod pg;
pub mod record;
pub mod statement;
pub mod store;

use sqlx::postgres::PgPoolOptions;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use module::{Fetched, Module, Query};
pub use pg::PgStore;
pub use record::{Computed, Record};
pub use store::{Store, StoreHandle};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
