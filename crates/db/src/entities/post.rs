use devsync_core::filter::{Filter, FilterNode, FilterValue, Operator, Scalar, Where};
use devsync_core::types::DbId;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::descriptor::{
    ComputedField, DefaultValue, EntityDescriptor, FieldDef, DEFAULT_CREATED_BY_FIELD,
};
use crate::error::StoreError;
use crate::module::Module;
use crate::record::{Computed, Record};
use crate::store::StoreHandle;

use super::{
    resolve_author, CommentRepo, LikeRepo, LikeTarget, PostCategoryRepo, CATEGORY, COMMENT, FAVORITE,
    LIKE,
};

/// Pseudo-field accepted in post filters: matches posts linked to the given
/// category ids.
pub const CATEGORIES_FILTER_FIELD: &str = "categories";

pub static POST: EntityDescriptor = EntityDescriptor {
    name: "post",
    table: "posts",
    fields: &[
        FieldDef::int("id"),
        FieldDef::text("title"),
        FieldDef::text("content"),
        FieldDef::bool("isTop"),
        FieldDef::text("status"),
        FieldDef::int("likes"),
        FieldDef::int("createdById"),
        FieldDef::timestamp("createdAt"),
    ],
    created_by_field: DEFAULT_CREATED_BY_FIELD,
    hidden: &[],
    defaults: &[
        ("isTop", DefaultValue::Bool(false)),
        ("status", DefaultValue::Text("active")),
        ("likes", DefaultValue::Int(0)),
        ("createdAt", DefaultValue::Now),
    ],
    computed: &[
        ComputedField { name: "author", resolve: resolve_author },
        ComputedField { name: "categories", resolve: resolve_categories },
        ComputedField { name: "commentsCount", resolve: resolve_comments_count },
    ],
    rewrite_filter: Some(rewrite_category_filter),
};

fn resolve_categories(record: &Record) -> BoxFuture<'_, Result<Computed, StoreError>> {
    Box::pin(async move {
        let Some(id) = record.id() else {
            return Ok(Computed::Many(Vec::new()));
        };
        let categories = PostCategoryRepo::categories_of_post(record.module().store(), id).await?;
        Ok(Computed::Many(categories))
    })
}

fn resolve_comments_count(record: &Record) -> BoxFuture<'_, Result<Computed, StoreError>> {
    Box::pin(async move {
        let Some(id) = record.id() else {
            return Ok(Computed::Value(Value::from(0)));
        };
        let count = record
            .module()
            .sibling(&COMMENT)
            .count(Filter::from(Where::eq("postId", id)))
            .await?;
        Ok(Computed::Value(Value::from(count)))
    })
}

fn rewrite_category_filter(module: &Module, filter: Filter) -> BoxFuture<'_, Result<Filter, StoreError>> {
    Box::pin(async move {
        let mut filter = filter;
        for node in filter.nodes_mut() {
            match node {
                FilterNode::Where(w) => rewrite_category_predicate(module.store(), w).await?,
                FilterNode::AnyOf(group) => {
                    for w in group.iter_mut() {
                        rewrite_category_predicate(module.store(), w).await?;
                    }
                }
            }
        }
        Ok(filter)
    })
}

/// `categories IN (..)` becomes `id IN (linked post ids)`; no linked posts
/// leaves an empty list, which never matches.
async fn rewrite_category_predicate(store: &StoreHandle, w: &mut Where) -> Result<(), StoreError> {
    if w.field != CATEGORIES_FILTER_FIELD {
        return Ok(());
    }
    let category_ids: Vec<Scalar> = match &w.value {
        FilterValue::Scalar(s) => vec![s.clone()],
        FilterValue::List(items) => items.clone(),
        FilterValue::Null | FilterValue::Unbound => Vec::new(),
    };
    let post_ids = PostCategoryRepo::post_ids_for_categories(store, category_ids).await?;
    let operator = match w.operator {
        Operator::NotIn | Operator::NotEq => Operator::NotIn,
        _ => Operator::In,
    };
    *w = Where::new("id", operator, post_ids);
    Ok(())
}

pub struct PostRepo;

impl PostRepo {
    pub fn module(store: &StoreHandle) -> Module {
        Module::new(&POST, store.clone())
    }

    /// Rewrite a post's category links to exactly `category_ids`, ignoring
    /// ids of categories that do not exist. Links already present are kept.
    ///
    /// Returns the linked category ids.
    pub async fn save_categories(
        store: &StoreHandle,
        post_id: DbId,
        category_ids: &[DbId],
    ) -> Result<Vec<DbId>, StoreError> {
        let links = PostCategoryRepo::module(store);
        let known = if category_ids.is_empty() {
            Vec::new()
        } else {
            links
                .sibling(&CATEGORY)
                .pluck_ids("id", Filter::from(Where::is_in("id", category_ids.to_vec())))
                .await?
        };

        let mut stale = Filter::from(Where::eq("postId", post_id));
        if !known.is_empty() {
            stale = stale.and(Where::new("categoryId", Operator::NotIn, known.clone()));
        }
        let removed = links.delete_where(stale).await?;

        let existing = PostCategoryRepo::category_ids_of_post(store, post_id).await?;
        let mut added = 0;
        for category_id in known.iter().filter(|id| !existing.contains(id)) {
            let mut attributes = Map::new();
            attributes.insert("postId".into(), Value::from(post_id));
            attributes.insert("categoryId".into(), Value::from(*category_id));
            links.create(attributes).await?;
            added += 1;
        }
        tracing::debug!(post_id, added, removed, "Post categories saved");
        Ok(known)
    }

    /// Store the number of `like`-type likes on a post into its `likes`
    /// column. Returns the new count, or `None` when the post does not exist.
    pub async fn recalculate_likes(store: &StoreHandle, post_id: DbId) -> Result<Option<i64>, StoreError> {
        let posts = Self::module(store);
        let filter = Filter::new()
            .and(Where::eq("postId", post_id))
            .and(Where::eq("type", "like"));
        let likes = posts.sibling(&LIKE).count(filter).await?;
        let updated = posts
            .update_where(&[("likes", Value::from(likes))], Filter::from(Where::eq("id", post_id)))
            .await?;
        if updated == 0 {
            return Ok(None);
        }
        tracing::debug!(post_id, likes, "Post likes recalculated");
        Ok(Some(likes))
    }

    /// Delete the comments, likes, favorites and category links of a post.
    ///
    /// Returns the users whose rating counted one of the removed likes, so
    /// the caller can recalculate them once the post itself is gone.
    pub async fn remove_dependents(store: &StoreHandle, post_id: DbId) -> Result<Vec<DbId>, StoreError> {
        let comment_ids: Vec<DbId> = CommentRepo::comments_of_post(store, post_id)
            .await?
            .iter()
            .filter_map(Record::id)
            .collect();

        let mut rated = Vec::new();
        let targets = std::iter::once(LikeTarget::Post(post_id))
            .chain(comment_ids.iter().copied().map(LikeTarget::Comment));
        for target in targets {
            if LikeRepo::likes_for_target(store, target).await?.is_empty() {
                continue;
            }
            if let Some(owner) = LikeRepo::target_owner(store, target).await? {
                if !rated.contains(&owner) {
                    rated.push(owner);
                }
            }
        }

        let posts = Self::module(store);
        let by_post = || Filter::from(Where::eq("postId", post_id));
        let mut likes = posts.sibling(&LIKE).delete_where(by_post()).await?;
        if !comment_ids.is_empty() {
            likes += posts
                .sibling(&LIKE)
                .delete_where(Filter::from(Where::is_in("commentId", comment_ids.clone())))
                .await?;
        }
        posts.sibling(&COMMENT).delete_where(by_post()).await?;
        posts.sibling(&FAVORITE).delete_where(by_post()).await?;
        PostCategoryRepo::module(store).delete_where(by_post()).await?;

        tracing::debug!(post_id, comments = comment_ids.len(), likes, "Post dependents removed");
        Ok(rated)
    }
}
