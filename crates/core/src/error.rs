use crate::types::DbId;
use crate::validation::FieldViolation;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The row is missing or hidden by row-level policy. Both causes share
    /// this variant so callers cannot tell them apart.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Field-level validation failure with every violation collected.
    #[error("Validation failed on {} field(s)", errors.len())]
    ValidationFailed {
        errors: Vec<FieldViolation>,
        successes: Vec<String>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Access denial for a verb with no resolvable criteria.
    ///
    /// Anonymous actors get `Unauthorized` (401), authenticated ones get
    /// `Forbidden` (403).
    pub fn access_denied(authenticated: bool) -> Self {
        if authenticated {
            CoreError::Forbidden("Access denied!".into())
        } else {
            CoreError::Unauthorized("Access denied!".into())
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn access_denied_distinguishes_anonymous_from_authenticated() {
        assert_matches!(CoreError::access_denied(false), CoreError::Unauthorized(_));
        assert_matches!(CoreError::access_denied(true), CoreError::Forbidden(_));
    }

    #[test]
    fn validation_failed_message_counts_fields() {
        let err = CoreError::ValidationFailed {
            errors: vec![
                FieldViolation::new("title", "required"),
                FieldViolation::new("content", "required"),
            ],
            successes: vec!["status".into()],
        };
        assert_eq!(err.to_string(), "Validation failed on 2 field(s)");
    }
}
