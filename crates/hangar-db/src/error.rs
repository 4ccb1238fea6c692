//! Error types for hangar-db.

use miette::Diagnostic;
use thiserror::Error;

/// Database error type for hangar-db operations.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Database connection failed: {0}")]
    #[diagnostic(
        code(hangar_db::connection),
        help("Check if the database file exists and is accessible")
    )]
    ConnectionError(String),

    #[error("Database query failed: {0}")]
    #[diagnostic(code(hangar_db::query))]
    QueryError(String),

    #[error("Database migration failed: {0}")]
    #[diagnostic(
        code(hangar_db::migration),
        help("The database schema may be corrupted. Restore it from a backup.")
    )]
    MigrationError(String),

    #[error("Record not found: {0}")]
    #[diagnostic(code(hangar_db::not_found))]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    #[diagnostic(
        code(hangar_db::constraint),
        help("A row with the same unique key already exists")
    )]
    ConstraintViolation(String),
}

impl From<diesel::result::Error> for DbError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => DbError::NotFound("Record not found".to_string()),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            | Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                DbError::ConstraintViolation(info.message().to_string())
            }
            Error::DatabaseError(_, info) => DbError::QueryError(info.message().to_string()),
            other => DbError::QueryError(other.to_string()),
        }
    }
}

impl From<diesel::result::ConnectionError> for DbError {
    fn from(err: diesel::result::ConnectionError) -> Self {
        DbError::ConnectionError(err.to_string())
    }
}

/// Result type alias for hangar-db operations.
pub type Result<T> = std::result::Result<T, DbError>;
