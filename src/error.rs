use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorktimeError {
    /// Referenced employee, checkpoint or other record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input or an operation the current state does not allow.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, WorktimeError>;

impl WorktimeError {
    pub fn not_found(what: impl Into<String>) -> Self {
        WorktimeError::NotFound(what.into())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        WorktimeError::InvalidArgument(what.into())
    }

    /// Caller-facing failures, as opposed to store faults.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WorktimeError::NotFound(_) | WorktimeError::InvalidArgument(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_told_apart_from_store_faults() {
        assert!(WorktimeError::not_found("employee 1").is_client_error());
        assert!(WorktimeError::invalid("bad month").is_client_error());
        assert!(!WorktimeError::Database(sqlx::Error::PoolTimedOut).is_client_error());
    }
}
