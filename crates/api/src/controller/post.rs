//! Post controller: public reads of active posts, owner-scoped writes and
//! category links.

use devsync_core::access::{owner_scope, TemplateNode, TemplatePredicate, Verb};
use devsync_core::filter::{Filter, Operator, Scalar, Where};
use devsync_core::roles::Actor;
use devsync_core::sort::{Direction, SortKey};
use devsync_core::types::DbId;
use devsync_core::validation::{Check, FieldRule, FieldRules};
use devsync_db::entities::post::CATEGORIES_FILTER_FIELD;
use devsync_db::entities::{FavoriteRepo, PostRepo, UserRepo, POST};
use devsync_db::{Record, StoreHandle};
use serde_json::{Map, Value};

use super::params::{self, Params};
use super::EntityController;
use crate::error::AppResult;
use crate::response::Listing;

/// Fields clients may sort posts by.
pub const SORTABLE: &[&str] = &["createdAt", "likes"];

const STATUSES: &[&str] = &["active", "inactive"];

/// Body key carrying the comma-separated category ids of a post.
const CATEGORIES_BODY_FIELD: &str = "categories";

fn rules() -> FieldRules {
    FieldRules::new()
        .rule(FieldRule::new("title").check(Check::Required, "Title cannot be empty"))
        .rule(FieldRule::new("content").check(Check::Required, "Content cannot be empty"))
        .rule(
            FieldRule::new("status")
                .optional()
                .check(Check::OneOf(STATUSES), "Status must be active or inactive"),
        )
}

pub fn controller(per_page: i64) -> EntityController {
    let mut ctl = EntityController::new(&POST)
        .validated(rules(), rules())
        .sorted(SortKey::by("createdAt", Direction::Desc), SORTABLE)
        .paginated(per_page);

    let writable = ctl.fields_except(&["likes", "isTop"]);
    let owner = POST.created_by_field;
    let active = TemplatePredicate::literal("status", Operator::Eq, "active");

    let policy = ctl.policy_mut();
    policy
        .user_mut()
        .set_create(&writable, vec![])
        .set_read(
            &[],
            vec![TemplateNode::AnyOf(vec![
                TemplatePredicate::owned_by(owner),
                active.clone(),
            ])],
        )
        .set_update(&writable, owner_scope(owner))
        .set_delete(&writable, owner_scope(owner));
    policy.guest_mut().set_read(&[], vec![active.into()]);
    ctl
}

/// Narrowing filter from list query parameters.
///
/// `id` and `categories` take comma lists; `createdAtFrom`/`createdAtTo`
/// bound `createdAt` inclusively.
pub fn filter_from(params: &Params) -> Filter {
    let mut filter = Filter::new();
    let predicates = [
        params::one_of(params, "id", "id"),
        params::eq(params, "status"),
        params::eq(params, "isTop"),
        params::eq(params, "createdById"),
        params::one_of(params, "categories", CATEGORIES_FILTER_FIELD),
        params
            .get("createdAtFrom")
            .map(|raw| Where::new("createdAt", Operator::Gte, Scalar::from_param(raw))),
        params
            .get("createdAtTo")
            .map(|raw| Where::new("createdAt", Operator::Lte, Scalar::from_param(raw))),
    ];
    for w in predicates.into_iter().flatten() {
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

/// Posts linked to one category.
pub async fn list_by_category(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    category_id: DbId,
    params: &Params,
) -> AppResult<Listing> {
    let mut params = params.clone();
    params.insert("categories".into(), category_id.to_string());
    list(ctl, store, actor, &params).await
}

/// Posts created by one user.
pub async fn list_by_user(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    user_id: DbId,
    params: &Params,
) -> AppResult<Listing> {
    let mut params = params.clone();
    params.insert("createdById".into(), user_id.to_string());
    list(ctl, store, actor, &params).await
}

/// Posts a user marked as favorite. No favorites lists nothing.
pub async fn list_favorites(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    user_id: DbId,
    params: &Params,
) -> AppResult<Listing> {
    let post_ids = FavoriteRepo::post_ids_by_user(store, user_id).await?;
    let filter = filter_from(params).and(Where::is_in("id", post_ids));
    ctl.get_all(
        store,
        actor,
        filter,
        ctl.sort_from(params::sort_by(params)),
        params::page(params),
    )
    .await
}

/// Create a post, then link the categories named in the body.
pub async fn create(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    mut body: Map<String, Value>,
) -> AppResult<Record> {
    let categories = body.remove(CATEGORIES_BODY_FIELD);
    let post = ctl.create(store, actor, body).await?;
    let post_id = post.id().unwrap_or_default();
    tracing::info!(post_id, user_id = actor.map(|a| a.id), "Post created");
    match categories {
        Some(raw) => link_categories(ctl, store, post_id, &raw).await,
        None => Ok(post),
    }
}

/// Update a post the actor may edit; a `categories` body field rewrites
/// its category links.
pub async fn update(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    id: DbId,
    mut body: Map<String, Value>,
) -> AppResult<Record> {
    let categories = body.remove(CATEGORIES_BODY_FIELD);
    let criteria = ctl.resolve_policy(actor, Verb::Update)?;
    ctl.validate_input(Verb::Update, &body)?;
    let record = ctl.authorize_row(store, &criteria, id).await?;
    let post = ctl.execute_update(store, &criteria, record, body).await?;
    match categories {
        Some(raw) => link_categories(ctl, store, id, &raw).await,
        None => Ok(post),
    }
}

/// Delete a post the actor owns together with its comments, likes,
/// favorites and category links. Ratings fed by the removed likes are
/// recalculated.
pub async fn delete(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    id: DbId,
) -> AppResult<Record> {
    let criteria = ctl.resolve_policy(actor, Verb::Delete)?;
    let mut post = ctl.authorize_row(store, &criteria, id).await?;
    let rated = PostRepo::remove_dependents(store, id).await?;
    post.delete().await?;
    for user_id in rated {
        UserRepo::recalculate_rating(store, user_id).await?;
    }
    tracing::info!(post_id = id, "Post deleted");
    Ok(post)
}

async fn link_categories(
    ctl: &EntityController,
    store: &StoreHandle,
    post_id: DbId,
    raw: &Value,
) -> AppResult<Record> {
    let linked = PostRepo::save_categories(store, post_id, &params::ids_from_value(raw)).await?;
    tracing::debug!(post_id, categories = linked.len(), "Post categories linked");
    ctl.reload(store, post_id).await
}
