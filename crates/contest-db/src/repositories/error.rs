//! Error handling utilities for repositories

use contest_core::error::DomainError;
use contest_core::value_objects::ContestId;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// SQLSTATE for a value outside its column's range
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Check for numeric overflow and return appropriate error or fallback
pub fn map_out_of_range<F>(e: SqlxError, on_overflow: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
            return on_overflow();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Check for a foreign key violation and return appropriate error or fallback
pub fn map_foreign_key_violation<F>(e: SqlxError, on_fk: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return on_fk();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Create a "contest not found" error
pub fn contest_not_found(id: ContestId) -> DomainError {
    DomainError::ContestNotFound(id)
}
