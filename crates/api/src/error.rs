use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use devsync_core::error::CoreError;
use devsync_db::StoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`StoreError`] for persistence
/// failures. Implements [`IntoResponse`] to produce consistent JSON error
/// bodies: `{"message", "code"}`, plus `validationErrs` and
/// `validationSuccesses` for field validation failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `devsync_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure at the store boundary.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::ValidationFailed { errors, successes } => {
                    let body = json!({
                        "message": "Validation failed. Fix your input and try again.",
                        "code": "VALIDATION_ERROR",
                        "validationErrs": errors,
                        "validationSuccesses": successes,
                    });
                    return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
                }
                CoreError::Conflict(msg) => (StatusCode::BAD_REQUEST, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },

            // --- Store errors ---
            AppError::Store(err) => classify_store_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let body = json!({
            "message": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a store error into an HTTP status, error code, and message.
///
/// - Values that cannot be stored in their column map to 400.
/// - Postgres unique violations map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::InvalidValue { .. } => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
        }
        StoreError::Database(sqlx::Error::Database(db_err))
            if db_err.code().as_deref() == Some("23505") =>
        {
            (
                StatusCode::CONFLICT,
                "CONFLICT",
                "Duplicate value violates a unique constraint".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use devsync_core::validation::FieldViolation;

    use super::*;

    #[test]
    fn access_denial_statuses() {
        let anonymous = AppError::from(CoreError::access_denied(false)).into_response();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
        let authenticated = AppError::from(CoreError::access_denied(true)).into_response();
        assert_eq!(authenticated.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn validation_failure_is_bad_request() {
        let err = CoreError::ValidationFailed {
            errors: vec![FieldViolation::new("title", "Title cannot be empty")],
            successes: vec!["content".into()],
        };
        assert_eq!(AppError::from(err).into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failures_are_sanitized() {
        let invalid = AppError::from(StoreError::invalid_value("likes", "expected Int"));
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);
        let unknown = AppError::from(StoreError::UnknownTable("nope".into()));
        assert_eq!(unknown.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
