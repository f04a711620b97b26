//! Concrete DevSync entity types.
//!
//! Each submodule exposes a static [`EntityDescriptor`] plus a zero-sized
//! repository struct with the entity-level operations. Repository methods
//! take the shared [`StoreHandle`] as their first argument.

pub mod category;
pub mod comment;
pub mod favorite;
pub mod like;
pub mod post;
pub mod post_category;
pub mod user;

use futures::future::BoxFuture;

pub use category::{CategoryRepo, CATEGORY};
pub use comment::{CommentRepo, COMMENT};
pub use favorite::{FavoriteRepo, FAVORITE};
pub use like::{LikeRepo, LikeTarget, LIKE};
pub use post::{PostRepo, POST};
pub use post_category::{PostCategoryRepo, POST_CATEGORY};
pub use user::{UserRepo, USER};

use crate::descriptor::EntityDescriptor;
use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::record::{Computed, Record};

/// Every entity type, in schema creation order.
pub fn all() -> [&'static EntityDescriptor; 7] {
    [&USER, &CATEGORY, &POST, &POST_CATEGORY, &FAVORITE, &COMMENT, &LIKE]
}

/// An empty in-memory store with a table for every entity type.
pub fn memory_store() -> MemoryStore {
    MemoryStore::for_entities(&all())
}

/// `author` computed field: the user referenced by the record's owner column.
pub(crate) fn resolve_author(record: &Record) -> BoxFuture<'_, Result<Computed, StoreError>> {
    Box::pin(async move {
        let owner = record.module().descriptor().created_by_field;
        let Some(user_id) = record.get_i64(owner) else {
            return Ok(Computed::One(None));
        };
        let author = record.module().sibling(&USER).get_by_id(user_id).await?;
        Ok(Computed::one(author))
    })
}
