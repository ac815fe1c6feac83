//! Repository error type shared by all ledger repositories.

use fintrack_core::ledger::LedgerError;
use sea_orm::{DbErr, SqlErr};

/// Errors returned by repositories.
///
/// Domain failures keep their `LedgerError` so the HTTP layer can map them to
/// the right status. Everything else is a storage failure.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Domain rule violation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Maps a unique-constraint violation to `DuplicateName`, anything else to `Database`.
    pub(crate) fn unique_or_db(err: DbErr, name: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                LedgerError::DuplicateName(name.to_string()).into()
            }
            _ => Self::Database(err),
        }
    }

    /// Returns the domain error, if this is one.
    #[must_use]
    pub const fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            Self::Ledger(err) => Some(err),
            Self::Database(_) => None,
        }
    }
}

/// Result alias for repository calls.
pub type RepoResult<T> = Result<T, RepositoryError>;
