//! Like controller: one like or dislike per user and target, with the
//! denormalized counters kept current.

use devsync_core::access::Verb;
use devsync_core::error::CoreError;
use devsync_core::filter::{Filter, Where};
use devsync_core::roles::Actor;
use devsync_core::types::DbId;
use devsync_core::validation::{Check, FieldRule, FieldRules};
use devsync_db::entities::like::LIKE_TYPES;
use devsync_db::entities::{LikeRepo, LikeTarget, COMMENT, LIKE, POST};
use devsync_db::{Record, StoreHandle};
use serde_json::{Map, Value};

use super::params::{self, Params};
use super::EntityController;
use crate::error::AppResult;
use crate::response::Listing;

fn rules() -> FieldRules {
    FieldRules::new().rule(
        FieldRule::new("type")
            .check(Check::Required, "Like type is required")
            .check(Check::OneOf(LIKE_TYPES), "Like type must be like or dislike"),
    )
}

pub fn controller() -> EntityController {
    let mut ctl = EntityController::new(&LIKE).validated(rules(), FieldRules::new());
    let policy = ctl.policy_mut();
    policy.user_mut().set_read(&[], vec![]);
    policy.guest_mut().set_read(&[], vec![]);
    ctl
}

fn target_where(target: LikeTarget) -> Where {
    Where::eq(target.field(), target.id())
}

fn target_missing(target: LikeTarget) -> CoreError {
    let entity = match target {
        LikeTarget::Post(_) => POST.name,
        LikeTarget::Comment(_) => COMMENT.name,
    };
    CoreError::NotFound { entity, id: target.id() }
}

/// Likes on one post or comment.
pub async fn list_for_target(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    target: LikeTarget,
    params: &Params,
) -> AppResult<Listing> {
    ctl.get_all(
        store,
        actor,
        Filter::from(target_where(target)),
        ctl.sort_from(params::sort_by(params)),
        params::page(params),
    )
    .await
}

/// Like or dislike a target.
///
/// A first vote inserts a row, a changed vote updates it and a repeated
/// vote leaves it as is. The target's counters are refreshed afterwards.
pub async fn upsert(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    target: LikeTarget,
    mut body: Map<String, Value>,
) -> AppResult<Record> {
    let criteria = ctl.resolve_policy(actor, Verb::Create)?;
    ctl.validate_input(Verb::Create, &body)?;
    let actor = actor.ok_or_else(|| CoreError::access_denied(false))?;
    if !LikeRepo::target_exists(store, target).await? {
        return Err(target_missing(target).into());
    }

    let kind = body.get("type").and_then(Value::as_str).unwrap_or_default().to_string();
    let like = match LikeRepo::find_by_actor_and_target(store, actor.id, target).await? {
        None => {
            body.remove("postId");
            body.remove("commentId");
            body.insert(target.field().into(), Value::from(target.id()));
            ctl.execute_create(store, Some(actor), &criteria, body).await?
        }
        Some(existing) if existing.get_str("type") == Some(kind.as_str()) => existing,
        Some(mut existing) => {
            existing.set("type", kind.as_str());
            existing.save().await?;
            existing
        }
    };

    LikeRepo::refresh_counters(store, target).await?;
    tracing::info!(
        like_id = like.id(),
        user_id = actor.id,
        target = target.field(),
        target_id = target.id(),
        kind = %kind,
        "Like stored",
    );
    Ok(like)
}

/// Remove the actor's like from a target, then refresh its counters.
pub async fn delete_for_target(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    target: LikeTarget,
    id: DbId,
) -> AppResult<Record> {
    let mut criteria = ctl.resolve_policy(actor, Verb::Delete)?;
    criteria.filter.push(target_where(target));
    let mut like = ctl.authorize_row(store, &criteria, id).await?;
    like.delete().await?;
    LikeRepo::refresh_counters(store, target).await?;
    tracing::info!(like_id = id, target = target.field(), target_id = target.id(), "Like removed");
    Ok(like)
}
