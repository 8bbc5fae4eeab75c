//! The module contains the errors the engine can return.
//!
//! The errors are:
//!
//! - [`StoreNotReady`] returned when the store is used before it was opened.
//! - [`NotFound`] returned when a record is missing from a container.
//! - [`ProtectedRecord`] returned when deleting a default record.
//! - [`WriteConflict`] returned when a key is created twice.
//! - [`Validation`] returned before persisting an invalid record.
//! - [`InvalidRecord`] returned when a stored row cannot be decoded.
//! - [`Identity`] returned by the identity provider on sign-in failures.
//! - [`Persistence`] wraps any failure of the underlying database.
//!
//!  [`StoreNotReady`]: EngineError::StoreNotReady
//!  [`NotFound`]: EngineError::NotFound
//!  [`ProtectedRecord`]: EngineError::ProtectedRecord
//!  [`WriteConflict`]: EngineError::WriteConflict
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidRecord`]: EngineError::InvalidRecord
//!  [`Identity`]: EngineError::Identity
//!  [`Persistence`]: EngineError::Persistence
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Store not ready: call init() first")]
    StoreNotReady,
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("\"{0}\" is a default record and cannot be deleted")]
    ProtectedRecord(String),
    #[error("\"{0}\" already present!")]
    WriteConflict(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
    #[error("Identity provider error: {0}")]
    Identity(String),
    #[error(transparent)]
    Persistence(#[from] DbErr),
}

impl EngineError {
    /// Map an insert failure, turning unique-key violations into
    /// [`EngineError::WriteConflict`].
    pub(crate) fn from_insert(err: DbErr, key: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::WriteConflict(key.to_string()),
            _ => Self::Persistence(err),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::StoreNotReady, Self::StoreNotReady) => true,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::ProtectedRecord(a), Self::ProtectedRecord(b)) => a == b,
            (Self::WriteConflict(a), Self::WriteConflict(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidRecord(a), Self::InvalidRecord(b)) => a == b,
            (Self::Identity(a), Self::Identity(b)) => a == b,
            (Self::Persistence(a), Self::Persistence(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
