//! Favorite controller: users bookmark posts.

use devsync_core::access::Verb;
use devsync_core::error::CoreError;
use devsync_core::filter::Where;
use devsync_core::roles::Actor;
use devsync_core::types::DbId;
use devsync_db::entities::{FavoriteRepo, PostRepo, FAVORITE, POST};
use devsync_db::{Record, StoreHandle};
use serde_json::{Map, Value};

use super::EntityController;
use crate::error::AppResult;

pub fn controller() -> EntityController {
    let mut ctl = EntityController::new(&FAVORITE);
    ctl.policy_mut().user_mut().remove_read().remove_update();
    ctl
}

/// Mark a post as the actor's favorite. Marking it twice is a conflict.
pub async fn add(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    post_id: DbId,
) -> AppResult<Record> {
    let criteria = ctl.resolve_policy(actor, Verb::Create)?;
    let actor = actor.ok_or_else(|| CoreError::access_denied(false))?;
    if PostRepo::module(store).get_by_id(post_id).await?.is_none() {
        return Err(CoreError::NotFound { entity: POST.name, id: post_id }.into());
    }
    if FavoriteRepo::find_by_user_and_post(store, actor.id, post_id).await?.is_some() {
        return Err(CoreError::Conflict("This post is already in your favorites".into()).into());
    }

    let mut body = Map::new();
    body.insert("postId".into(), Value::from(post_id));
    let favorite = ctl.execute_create(store, Some(actor), &criteria, body).await?;
    tracing::info!(post_id, user_id = actor.id, "Post added to favorites");
    Ok(favorite)
}

/// Remove a post from the actor's favorites.
pub async fn remove(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    post_id: DbId,
) -> AppResult<Record> {
    let criteria = ctl.resolve_policy(actor, Verb::Delete)?;
    let filter = criteria.filter.and(Where::eq("postId", post_id));
    let mut favorite = ctl
        .module(store)
        .find_one(filter)
        .await?
        .ok_or(CoreError::NotFound { entity: FAVORITE.name, id: post_id })?;
    favorite.delete().await?;
    tracing::info!(post_id, user_id = actor.map(|a| a.id), "Post removed from favorites");
    Ok(favorite)
}
