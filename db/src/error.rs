use sea_orm::DbErr;
use thiserror::Error;

/// Domain rule violations surfaced by model operations.
///
/// The api crate maps each variant onto an HTTP status:
/// `Invalid` → 400, `NotFound` → 404, `Forbidden` → 403, `Conflict` → 409,
/// `Db` → 500.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl DomainError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        DomainError::Invalid(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        DomainError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        DomainError::Conflict(msg.into())
    }

    /// True when the backing store rejected a write on a unique index.
    pub fn is_unique_violation(err: &DbErr) -> bool {
        err.to_string().contains("UNIQUE constraint failed")
    }

    /// Translate a unique-index rejection into `Conflict`, leaving other
    /// database failures untouched. Insert paths use this so that racing
    /// writers which pass the duplicate pre-check still surface a clean
    /// conflict instead of a 500.
    pub fn on_conflict(err: DbErr, message: &str) -> Self {
        if Self::is_unique_violation(&err) {
            DomainError::Conflict(message.to_string())
        } else {
            DomainError::Db(err)
        }
    }
}
