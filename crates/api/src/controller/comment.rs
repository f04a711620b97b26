//! Comment controller: threaded comments on posts and the post author's
//! "best answer" pick.

use devsync_core::access::{owner_scope, Verb};
use devsync_core::error::CoreError;
use devsync_core::filter::{Filter, Where};
use devsync_core::roles::Actor;
use devsync_core::sort::{Direction, SortKey};
use devsync_core::types::DbId;
use devsync_core::validation::{Check, FieldRule, FieldRules};
use devsync_db::entities::{CommentRepo, PostRepo, COMMENT, POST};
use devsync_db::{Record, StoreHandle};
use serde_json::{Map, Value};

use super::params::{self, Params};
use super::EntityController;
use crate::error::{AppError, AppResult};
use crate::response::Listing;

const STATUSES: &[&str] = &["active", "inactive"];

fn rules() -> FieldRules {
    FieldRules::new()
        .rule(FieldRule::new("content").check(Check::Required, "Content cannot be empty"))
        .rule(
            FieldRule::new("status")
                .optional()
                .check(Check::OneOf(STATUSES), "Status must be active or inactive"),
        )
}

pub fn controller() -> EntityController {
    let mut ctl = EntityController::new(&COMMENT)
        .validated(rules(), rules())
        .sorted(
            SortKey::by("isBest", Direction::Desc).then("id", Direction::Desc),
            &[],
        );
    let policy = ctl.policy_mut();
    policy
        .user_mut()
        .set_read(&[], vec![])
        .set_update(&["content", "status", "isBest"], owner_scope(COMMENT.created_by_field));
    policy.guest_mut().set_read(&[], vec![]);
    ctl
}

/// `postId` lists top-level comments only; `commentId` lists replies.
pub fn filter_from(params: &Params) -> Filter {
    let mut filter = Filter::new();
    if let Some(w) = params::eq(params, "createdById") {
        filter.push(w);
    }
    if let Some(w) = params::eq(params, "postId") {
        filter.push(w);
        filter.push(Where::is_null("commentId"));
    }
    if let Some(w) = params::eq(params, "commentId") {
        filter.push(w);
    }
    filter
}

pub async fn list(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    params: &Params,
) -> AppResult<Listing> {
    ctl.get_all(
        store,
        actor,
        filter_from(params),
        ctl.sort_from(params::sort_by(params)),
        params::page(params),
    )
    .await
}

/// Top-level comments of a post.
pub async fn list_of_post(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    post_id: DbId,
    params: &Params,
) -> AppResult<Listing> {
    let mut params = params.clone();
    params.remove("commentId");
    params.insert("postId".into(), post_id.to_string());
    list(ctl, store, actor, &params).await
}

/// Direct replies to a comment.
pub async fn list_replies(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    comment_id: DbId,
    params: &Params,
) -> AppResult<Listing> {
    let mut params = params.clone();
    params.remove("postId");
    params.insert("commentId".into(), comment_id.to_string());
    list(ctl, store, actor, &params).await
}

/// Add a top-level comment to an existing post.
pub async fn create_for_post(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    post_id: DbId,
    mut body: Map<String, Value>,
) -> AppResult<Record> {
    ctl.resolve_policy(actor, Verb::Create)?;
    if PostRepo::module(store).get_by_id(post_id).await?.is_none() {
        return Err(CoreError::NotFound { entity: POST.name, id: post_id }.into());
    }
    body.remove("commentId");
    body.insert("postId".into(), Value::from(post_id));
    let comment = ctl.create(store, actor, body).await?;
    tracing::info!(comment_id = comment.id(), post_id, "Comment created");
    Ok(comment)
}

/// Reply to a comment. The reply belongs to the parent's post.
pub async fn reply(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    comment_id: DbId,
    mut body: Map<String, Value>,
) -> AppResult<Record> {
    ctl.resolve_policy(actor, Verb::Create)?;
    let parent = CommentRepo::module(store)
        .get_by_id(comment_id)
        .await?
        .ok_or(CoreError::NotFound { entity: COMMENT.name, id: comment_id })?;
    body.insert("commentId".into(), Value::from(comment_id));
    body.insert(
        "postId".into(),
        parent.get("postId").cloned().unwrap_or(Value::Null),
    );
    let reply = ctl.create(store, actor, body).await?;
    tracing::info!(comment_id = reply.id(), parent_id = comment_id, "Reply created");
    Ok(reply)
}

/// Toggle `isBest` on a comment. Only the author of the commented post may
/// do this.
pub async fn set_best(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    id: DbId,
) -> AppResult<Record> {
    ctl.resolve_policy(actor, Verb::Update)?;
    let actor = actor.ok_or_else(|| CoreError::access_denied(false))?;

    let mut comment = ctl
        .module(store)
        .get_by_id(id)
        .await?
        .ok_or(CoreError::NotFound { entity: COMMENT.name, id })?;
    let post_id = comment.get_i64("postId").unwrap_or_default();
    let post = PostRepo::module(store)
        .get_by_id(post_id)
        .await?
        .ok_or(CoreError::NotFound { entity: POST.name, id: post_id })?;

    if post.get_i64(POST.created_by_field) != Some(actor.id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the post creator can select the most helpful comment".into(),
        )));
    }

    let is_best = comment.get("isBest").and_then(Value::as_bool).unwrap_or(false);
    comment.set("isBest", !is_best);
    comment.save().await?;
    tracing::info!(comment_id = id, post_id, is_best = !is_best, "Best comment toggled");
    ctl.reload(store, id).await
}
