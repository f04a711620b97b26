use devsync_core::filter::{Filter, Where};
use devsync_core::types::DbId;

use crate::descriptor::{
    ComputedField, DefaultValue, EntityDescriptor, FieldDef, DEFAULT_CREATED_BY_FIELD,
};
use crate::error::StoreError;
use crate::module::{Module, Query};
use crate::record::Record;
use crate::store::StoreHandle;

use super::{resolve_author, PostRepo, UserRepo, COMMENT, POST};

pub const LIKE_TYPES: &[&str] = &["like", "dislike"];

pub static LIKE: EntityDescriptor = EntityDescriptor {
    name: "like",
    table: "likes",
    fields: &[
        FieldDef::int("id"),
        FieldDef::int("postId"),
        FieldDef::int("commentId"),
        FieldDef::int("createdById"),
        FieldDef::text("type"),
        FieldDef::timestamp("createdAt"),
    ],
    created_by_field: DEFAULT_CREATED_BY_FIELD,
    hidden: &[],
    defaults: &[("createdAt", DefaultValue::Now)],
    computed: &[ComputedField { name: "author", resolve: resolve_author }],
    rewrite_filter: None,
};

/// What a like is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post(DbId),
    Comment(DbId),
}

impl LikeTarget {
    /// Column of the like row referencing the target.
    pub fn field(self) -> &'static str {
        match self {
            LikeTarget::Post(_) => "postId",
            LikeTarget::Comment(_) => "commentId",
        }
    }

    pub fn id(self) -> DbId {
        match self {
            LikeTarget::Post(id) | LikeTarget::Comment(id) => id,
        }
    }

    fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            LikeTarget::Post(_) => &POST,
            LikeTarget::Comment(_) => &COMMENT,
        }
    }

    fn filter(self) -> Filter {
        Filter::from(Where::eq(self.field(), self.id()))
    }
}

pub struct LikeRepo;

impl LikeRepo {
    pub fn module(store: &StoreHandle) -> Module {
        Module::new(&LIKE, store.clone())
    }

    pub async fn find_by_actor_and_target(
        store: &StoreHandle,
        actor_id: DbId,
        target: LikeTarget,
    ) -> Result<Option<Record>, StoreError> {
        let filter = target.filter().and(Where::eq("createdById", actor_id));
        Self::module(store).find_one(filter).await
    }

    pub async fn likes_for_target(store: &StoreHandle, target: LikeTarget) -> Result<Vec<Record>, StoreError> {
        Self::module(store).find(Query::filtered(target.filter())).await
    }

    /// Author of the liked post or comment. `None` when the target is missing.
    pub async fn target_owner(store: &StoreHandle, target: LikeTarget) -> Result<Option<DbId>, StoreError> {
        let module = Module::new(target.descriptor(), store.clone());
        let owner = module.descriptor().created_by_field;
        let ids = module
            .pluck_ids(owner, Filter::from(Where::eq("id", target.id())))
            .await?;
        Ok(ids.first().copied())
    }

    /// Whether the target row exists.
    pub async fn target_exists(store: &StoreHandle, target: LikeTarget) -> Result<bool, StoreError> {
        let module = Module::new(target.descriptor(), store.clone());
        Ok(module.count(Filter::from(Where::eq("id", target.id()))).await? > 0)
    }

    /// Refresh the counters derived from likes on `target`: the post's
    /// `likes` column and the target author's rating.
    pub async fn refresh_counters(store: &StoreHandle, target: LikeTarget) -> Result<(), StoreError> {
        if let LikeTarget::Post(post_id) = target {
            PostRepo::recalculate_likes(store, post_id).await?;
        }
        if let Some(owner) = Self::target_owner(store, target).await? {
            UserRepo::recalculate_rating(store, owner).await?;
        }
        Ok(())
    }
}
