//! JWT-based actor extraction for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use devsync_core::error::CoreError;
use devsync_core::roles::{Actor, ROLE_USER};
use devsync_db::entities::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The acting user, if any.
///
/// - No `Authorization` header: anonymous (`None`), handled as the `guest`
///   role by access policies.
/// - A valid Bearer token for an existing user: that user, with the role
///   stored on their row.
/// - Anything else (malformed header, bad or expired token, deleted user):
///   rejected with 401.
///
/// ```ignore
/// async fn my_handler(MaybeActor(actor): MaybeActor) -> AppResult<Json<()>> {
///     tracing::info!(user_id = actor.as_ref().map(|a| a.id), "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MaybeActor(pub Option<Actor>);

impl MaybeActor {
    pub fn as_ref(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.into()))
}

impl FromRequestParts<AppState> for MaybeActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get("authorization") else {
            return Ok(MaybeActor(None));
        };
        let auth_header = auth_header
            .to_str()
            .map_err(|_| unauthorized("Invalid Authorization header"))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            unauthorized("Invalid Authorization format. Expected: Bearer <token>")
        })?;

        let claims = validate_token(token.trim(), &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        let user = UserRepo::module(&state.store)
            .get_by_id(claims.sub)
            .await?
            .ok_or_else(|| unauthorized("Invalid or expired token"))?;
        let role = user.get_str("role").unwrap_or(ROLE_USER);

        Ok(MaybeActor(Some(Actor::new(claims.sub, role))))
    }
}
