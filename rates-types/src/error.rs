//! Error types for the transfer rates service.

/// Domain-level errors (validation and column decoding).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing column `{0}`")]
    MissingColumn(String),

    #[error("Column `{column}` holds {found}, expected {expected}")]
    InvalidColumn {
        column: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Failure while turning a loaded entity graph into a response payload.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
    #[error("relation `{relation}` was not loaded")]
    RelationNotLoaded { relation: &'static str },

    #[error("related `{relation}` is missing")]
    MissingRelation { relation: &'static str },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(DomainError::ValidationError(msg)) => AppError::BadRequest(msg),
            RepoError::Conflict(msg) => AppError::BadRequest(msg),
            RepoError::Domain(e) => AppError::Internal(e.to_string()),
            RepoError::Database(_) => AppError::Internal("Internal server error".into()),
        }
    }
}

impl From<AssemblyError> for AppError {
    fn from(_: AssemblyError) -> Self {
        AppError::Internal("Internal server error".into())
    }
}
