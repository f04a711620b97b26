/// Failures raised at the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A written value cannot be stored in the column's declared kind.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Statement not supported here: {0}")]
    Unsupported(&'static str),

    #[error("Insert into {0} returned no id")]
    MissingId(String),
}

impl StoreError {
    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        StoreError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
