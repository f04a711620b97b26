use devsync_core::filter::{Filter, Where};
use devsync_core::sort::{Direction, SortKey};
use devsync_core::types::DbId;
use futures::future::BoxFuture;

use crate::descriptor::{
    ComputedField, DefaultValue, EntityDescriptor, FieldDef, DEFAULT_CREATED_BY_FIELD,
};
use crate::error::StoreError;
use crate::module::{Module, Query};
use crate::record::{Computed, Record};
use crate::store::StoreHandle;

use super::resolve_author;

pub static COMMENT: EntityDescriptor = EntityDescriptor {
    name: "comment",
    table: "comments",
    fields: &[
        FieldDef::int("id"),
        FieldDef::int("postId"),
        FieldDef::int("commentId"),
        FieldDef::int("createdById"),
        FieldDef::text("content"),
        FieldDef::bool("isBest"),
        FieldDef::text("status"),
        FieldDef::timestamp("createdAt"),
    ],
    created_by_field: DEFAULT_CREATED_BY_FIELD,
    hidden: &[],
    defaults: &[
        ("isBest", DefaultValue::Bool(false)),
        ("status", DefaultValue::Text("active")),
        ("createdAt", DefaultValue::Now),
    ],
    computed: &[
        ComputedField { name: "author", resolve: resolve_author },
        ComputedField { name: "comments", resolve: resolve_replies },
    ],
    rewrite_filter: None,
};

/// Replies nest: each reply resolves its own replies in turn.
fn resolve_replies(record: &Record) -> BoxFuture<'_, Result<Computed, StoreError>> {
    Box::pin(async move {
        let Some(id) = record.id() else {
            return Ok(Computed::Many(Vec::new()));
        };
        let replies = CommentRepo::replies_of(record.module().store(), id).await?;
        Ok(Computed::Many(replies))
    })
}

pub struct CommentRepo;

impl CommentRepo {
    pub fn module(store: &StoreHandle) -> Module {
        Module::new(&COMMENT, store.clone())
    }

    /// Direct replies to a comment, oldest first.
    pub async fn replies_of(store: &StoreHandle, comment_id: DbId) -> Result<Vec<Record>, StoreError> {
        let query = Query::filtered(Filter::from(Where::eq("commentId", comment_id)))
            .sort(SortKey::by("id", Direction::Asc));
        Self::module(store).find(query).await
    }

    /// Every comment on a post, replies included, oldest first.
    pub async fn comments_of_post(store: &StoreHandle, post_id: DbId) -> Result<Vec<Record>, StoreError> {
        let query = Query::filtered(Filter::from(Where::eq("postId", post_id)))
            .sort(SortKey::by("id", Direction::Asc));
        Self::module(store).find(query).await
    }
}
