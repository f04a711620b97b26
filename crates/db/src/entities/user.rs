use devsync_core::filter::{Filter, Where};
use devsync_core::types::DbId;
use serde_json::Value;

use crate::descriptor::{
    DefaultValue, EntityDescriptor, FieldDef, DEFAULT_CREATED_BY_FIELD,
};
use crate::error::StoreError;
use crate::module::Module;
use crate::record::Record;
use crate::store::StoreHandle;

use super::{COMMENT, LIKE, POST};

pub static USER: EntityDescriptor = EntityDescriptor {
    name: "user",
    table: "users",
    fields: &[
        FieldDef::int("id"),
        FieldDef::text("login"),
        FieldDef::text("email"),
        FieldDef::text("fullName"),
        FieldDef::text("password"),
        FieldDef::bool("isEmailVerified"),
        FieldDef::text("profilePicture"),
        FieldDef::int("rating"),
        FieldDef::text("role"),
        FieldDef::timestamp("createdAt"),
    ],
    created_by_field: DEFAULT_CREATED_BY_FIELD,
    hidden: &["password"],
    defaults: &[
        ("isEmailVerified", DefaultValue::Bool(false)),
        ("rating", DefaultValue::Int(0)),
        ("role", DefaultValue::Text("user")),
        ("createdAt", DefaultValue::Now),
    ],
    computed: &[],
    rewrite_filter: None,
};

pub struct UserRepo;

impl UserRepo {
    pub fn module(store: &StoreHandle) -> Module {
        Module::new(&USER, store.clone())
    }

    pub async fn get_by_login(store: &StoreHandle, login: &str) -> Result<Option<Record>, StoreError> {
        Self::module(store)
            .find_one(Filter::from(Where::eq("login", login)))
            .await
    }

    pub async fn get_by_email(store: &StoreHandle, email: &str) -> Result<Option<Record>, StoreError> {
        Self::module(store)
            .find_one(Filter::from(Where::eq("email", email)))
            .await
    }

    /// Recompute a user's rating from the likes on their posts and comments:
    /// +1 per like, -1 per dislike. Returns the stored rating, or `None`
    /// when the user does not exist.
    pub async fn recalculate_rating(store: &StoreHandle, user_id: DbId) -> Result<Option<i64>, StoreError> {
        let users = Self::module(store);
        if users.count(Filter::from(Where::eq("id", user_id))).await? == 0 {
            return Ok(None);
        }

        let owned = Filter::from(Where::eq("createdById", user_id));
        let post_ids = users.sibling(&POST).pluck_ids("id", owned.clone()).await?;
        let comment_ids = users.sibling(&COMMENT).pluck_ids("id", owned).await?;

        let likes = users.sibling(&LIKE);
        let mut rating = 0;
        for (target, ids) in [("postId", post_ids), ("commentId", comment_ids)] {
            if ids.is_empty() {
                continue;
            }
            for (kind, weight) in [("like", 1), ("dislike", -1)] {
                let filter = Filter::new()
                    .and(Where::is_in(target, ids.clone()))
                    .and(Where::eq("type", kind));
                rating += weight * likes.count(filter).await?;
            }
        }

        users
            .update_where(&[("rating", Value::from(rating))], Filter::from(Where::eq("id", user_id)))
            .await?;
        tracing::debug!(user_id, rating, "User rating recalculated");
        Ok(Some(rating))
    }
}
