use devsync_core::filter::{Filter, Where};
use devsync_core::types::DbId;

use crate::descriptor::{DefaultValue, EntityDescriptor, FieldDef, DEFAULT_CREATED_BY_FIELD};
use crate::error::StoreError;
use crate::module::Module;
use crate::record::Record;
use crate::store::StoreHandle;

pub static FAVORITE: EntityDescriptor = EntityDescriptor {
    name: "favorite",
    table: "posts_favorites",
    fields: &[
        FieldDef::int("id"),
        FieldDef::int("postId"),
        FieldDef::int("createdById"),
        FieldDef::timestamp("createdAt"),
    ],
    created_by_field: DEFAULT_CREATED_BY_FIELD,
    hidden: &[],
    defaults: &[("createdAt", DefaultValue::Now)],
    computed: &[],
    rewrite_filter: None,
};

pub struct FavoriteRepo;

impl FavoriteRepo {
    pub fn module(store: &StoreHandle) -> Module {
        Module::new(&FAVORITE, store.clone())
    }

    /// Ids of the posts a user marked as favorite, oldest mark first.
    pub async fn post_ids_by_user(store: &StoreHandle, user_id: DbId) -> Result<Vec<DbId>, StoreError> {
        Self::module(store)
            .pluck_ids("postId", Filter::from(Where::eq("createdById", user_id)))
            .await
    }

    pub async fn find_by_user_and_post(
        store: &StoreHandle,
        user_id: DbId,
        post_id: DbId,
    ) -> Result<Option<Record>, StoreError> {
        let filter = Filter::new()
            .and(Where::eq("createdById", user_id))
            .and(Where::eq("postId", post_id));
        Self::module(store).find_one(filter).await
    }
}
