//! Errors for execution.

/// Execution errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    DB(#[from] sqlx::Error),
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),
}
