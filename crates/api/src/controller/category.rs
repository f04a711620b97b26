//! Category controller. Categories are managed by admins and readable by
//! everyone.

use devsync_core::access::Verb;
use devsync_core::filter::Filter;
use devsync_core::roles::Actor;
use devsync_core::sort::{Direction, SortKey};
use devsync_core::types::DbId;
use devsync_core::validation::{Check, FieldRule, FieldRules};
use devsync_db::entities::{PostCategoryRepo, CATEGORY};
use devsync_db::StoreHandle;

use super::params::{self, Params};
use super::EntityController;
use crate::error::AppResult;
use crate::response::{Listing, Projection};

pub fn controller() -> EntityController {
    let create = FieldRules::new()
        .rule(FieldRule::new("title").check(Check::Required, "Title cannot be empty"));
    let update = FieldRules::new().rule(
        FieldRule::new("title")
            .optional()
            .check(Check::Required, "Title cannot be empty"),
    );

    let mut ctl = EntityController::new(&CATEGORY)
        .validated(create, update)
        .sorted(SortKey::by("id", Direction::Asc), &["title"]);
    let policy = ctl.policy_mut();
    policy.user_mut().remove_all().set_read(&[], vec![]);
    policy.guest_mut().set_read(&[], vec![]);
    ctl
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
        Filter::new(),
        ctl.sort_from(params::sort_by(params)),
        params::page(params),
    )
    .await
}

/// Categories linked to a post, ordered by id.
pub async fn list_of_post(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    post_id: DbId,
) -> AppResult<Vec<Projection>> {
    let criteria = ctl.resolve_policy(actor, Verb::Read)?;
    let categories = PostCategoryRepo::categories_of_post(store, post_id).await?;
    Ok(categories
        .iter()
        .map(|c| c.project_within(&criteria.fields))
        .collect())
}
