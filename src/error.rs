pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// PostgreSQL error code for a unique constraint violation
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    // No store configured
    #[error("Store is not configured")]
    Disabled,
    // Uniqueness violation on insert
    #[error("Member already exists")]
    Conflict,
    // The store answered with an error payload
    #[error("Store rejected request ({status}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },
    // Transport errors talking to the REST store
    #[error("Failed to reach store: {0}")]
    Request(#[from] reqwest::Error),
    // Database errors
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let duplicate = matches!(
            &e,
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
        );
        if duplicate {
            Self::Conflict
        } else {
            Self::Database(e)
        }
    }
}
