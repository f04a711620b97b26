//! User controller: registration, profiles and role-restricted edits.

use devsync_core::access::{TemplatePredicate, Verb};
use devsync_core::error::CoreError;
use devsync_core::filter::Filter;
use devsync_core::roles::Actor;
use devsync_core::sort::SortKey;
use devsync_core::types::DbId;
use devsync_core::validation::{Check, FieldRule, FieldRules, FieldViolation};
use devsync_db::entities::{UserRepo, USER};
use devsync_db::{Record, StoreHandle};
use serde_json::{Map, Value};

use super::params::{self, Params};
use super::EntityController;
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::response::Listing;

/// Fields clients may sort users by.
pub const SORTABLE: &[&str] = &["rating", "createdAt", "login"];

/// Fields an anonymous visitor may set when registering.
const REGISTRATION_FIELDS: &[&str] = &["login", "email", "fullName", "password", "profilePicture"];

const PASSWORD_MIN_LEN: usize = 5;

fn create_rules() -> FieldRules {
    FieldRules::new()
        .rule(
            FieldRule::new("email")
                .check(Check::Required, "Email is required")
                .check(Check::Email, "Email is invalid"),
        )
        .rule(
            FieldRule::new("login")
                .check(Check::Required, "Login is required")
                .check(Check::MinLength(4), "Login must be at least 4 characters long")
                .check(Check::Lowercase, "Login must be lowercase"),
        )
        .rule(
            FieldRule::new("fullName")
                .optional()
                .check(Check::MinLength(3), "Full name must be at least 3 characters long"),
        )
        .rule(FieldRule::new("password").check(
            Check::StrongPassword { min_len: PASSWORD_MIN_LEN },
            "Password must be at least 5 characters long and include an uppercase letter, a symbol and a number",
        ))
        .rule(
            FieldRule::new("password_confirm")
                .check(Check::Required, "Password confirmation is required")
                .check(
                    Check::MatchesField("password"),
                    "Password confirmation does not match the password",
                ),
        )
}

fn update_rules() -> FieldRules {
    FieldRules::new()
        .rule(
            FieldRule::new("fullName")
                .optional()
                .check(Check::MinLength(3), "Full name must be at least 3 characters long"),
        )
        .rule(FieldRule::new("password").optional().check(
            Check::StrongPassword { min_len: PASSWORD_MIN_LEN },
            "Password must be at least 5 characters long and include an uppercase letter, a symbol and a number",
        ))
        .rule(FieldRule::new("password_confirm").optional().check(
            Check::MatchesField("password"),
            "Password confirmation does not match the password",
        ))
}

pub fn controller() -> EntityController {
    let mut ctl = EntityController::new(&USER)
        .validated(create_rules(), update_rules())
        .sorted(SortKey::default(), SORTABLE);

    let admin_update = ctl.fields_except(&["login", "email", "rating"]);
    let user_update = ctl.fields_except(&[
        "login",
        "email",
        "rating",
        "role",
        "isEmailVerified",
        "createdAt",
    ]);

    let policy = ctl.policy_mut();
    policy.admin_mut().set_update(&admin_update, vec![]);
    policy
        .user_mut()
        .remove_create()
        .remove_delete()
        .set_read(&[], vec![])
        .set_update(&user_update, vec![TemplatePredicate::owned_by("id").into()]);
    policy
        .guest_mut()
        .set_read(&[], vec![])
        .set_create(REGISTRATION_FIELDS, vec![]);
    ctl
}

pub async fn list(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    params: &Params,
) -> AppResult<Listing> {
    let mut filter = Filter::new();
    for field in ["login", "role"] {
        if let Some(w) = params::eq(params, field) {
            filter.push(w);
        }
    }
    ctl.get_all(
        store,
        actor,
        filter,
        ctl.sort_from(params::sort_by(params)),
        params::page(params),
    )
    .await
}

/// Register a user. Login and email must be unused; the password is
/// stored hashed.
pub async fn create(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    mut body: Map<String, Value>,
) -> AppResult<Record> {
    let criteria = ctl.resolve_policy(actor, Verb::Create)?;
    let successes = ctl.validate_input(Verb::Create, &body)?;
    ensure_unique(store, &body, successes).await?;
    hash_password_field(&mut body)?;

    let user = ctl.execute_create(store, actor, &criteria, body).await?;
    tracing::info!(user_id = user.id(), login = user.get_str("login"), "User registered");
    Ok(user)
}

/// Update a user the actor may edit, hashing a new password.
pub async fn update(
    ctl: &EntityController,
    store: &StoreHandle,
    actor: Option<&Actor>,
    id: DbId,
    mut body: Map<String, Value>,
) -> AppResult<Record> {
    let criteria = ctl.resolve_policy(actor, Verb::Update)?;
    ctl.validate_input(Verb::Update, &body)?;
    let record = ctl.authorize_row(store, &criteria, id).await?;
    hash_password_field(&mut body)?;
    ctl.execute_update(store, &criteria, record, body).await
}

/// Fail validation when the login or email already belongs to a user.
async fn ensure_unique(
    store: &StoreHandle,
    body: &Map<String, Value>,
    mut successes: Vec<String>,
) -> AppResult<()> {
    let mut errors = Vec::new();
    if let Some(login) = body.get("login").and_then(Value::as_str) {
        if UserRepo::get_by_login(store, login).await?.is_some() {
            errors.push(FieldViolation::new("login", "Login already exists"));
        }
    }
    if let Some(email) = body.get("email").and_then(Value::as_str) {
        if UserRepo::get_by_email(store, email).await?.is_some() {
            errors.push(FieldViolation::new("email", "Email already exists"));
        }
    }
    if errors.is_empty() {
        return Ok(());
    }
    successes.retain(|field| !errors.iter().any(|e| &e.field == field));
    Err(CoreError::ValidationFailed { errors, successes }.into())
}

fn hash_password_field(body: &mut Map<String, Value>) -> AppResult<()> {
    let Some(Value::String(password)) = body.get("password") else {
        return Ok(());
    };
    let hash = hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;
    body.insert("password".into(), Value::String(hash));
    Ok(())
}
