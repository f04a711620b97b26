use devsync_core::filter::{Filter, Scalar, Where};
use devsync_core::sort::{Direction, SortKey};
use devsync_core::types::DbId;

use crate::descriptor::{DefaultValue, EntityDescriptor, FieldDef, DEFAULT_CREATED_BY_FIELD};
use crate::error::StoreError;
use crate::module::{Module, Query};
use crate::record::Record;
use crate::store::StoreHandle;

use super::CATEGORY;

/// Link table between posts and categories.
pub static POST_CATEGORY: EntityDescriptor = EntityDescriptor {
    name: "post category",
    table: "posts_categories",
    fields: &[
        FieldDef::int("id"),
        FieldDef::int("categoryId"),
        FieldDef::int("postId"),
        FieldDef::timestamp("createdAt"),
    ],
    created_by_field: DEFAULT_CREATED_BY_FIELD,
    hidden: &[],
    defaults: &[("createdAt", DefaultValue::Now)],
    computed: &[],
    rewrite_filter: None,
};

pub struct PostCategoryRepo;

impl PostCategoryRepo {
    pub fn module(store: &StoreHandle) -> Module {
        Module::new(&POST_CATEGORY, store.clone())
    }

    pub async fn category_ids_of_post(store: &StoreHandle, post_id: DbId) -> Result<Vec<DbId>, StoreError> {
        Self::module(store)
            .pluck_ids("categoryId", Filter::from(Where::eq("postId", post_id)))
            .await
    }

    /// Categories linked to a post, oldest category first.
    pub async fn categories_of_post(store: &StoreHandle, post_id: DbId) -> Result<Vec<Record>, StoreError> {
        let ids = Self::category_ids_of_post(store, post_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::filtered(Filter::from(Where::is_in("id", ids)))
            .sort(SortKey::by("id", Direction::Asc));
        Module::new(&CATEGORY, store.clone()).find(query).await
    }

    /// Distinct ids of posts linked to any of `category_ids`.
    pub async fn post_ids_for_categories(
        store: &StoreHandle,
        category_ids: Vec<Scalar>,
    ) -> Result<Vec<DbId>, StoreError> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids = Self::module(store)
            .pluck_ids("postId", Filter::from(Where::is_in("categoryId", category_ids)))
            .await?;
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}
