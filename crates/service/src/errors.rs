use std::fmt::Display;

use models::errors::ModelError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// The four failure kinds every operation is reduced to before it leaves the
/// service layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
}

impl ServiceError {
    /// `NotFound` in the shape clients see: "`Category with ID <key> not found`".
    pub fn not_found(label: &str, key: impl Display) -> Self {
        Self::NotFound(format!("{label} with ID {key} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => Self::Validation(msg),
        }
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                return Self::Conflict(format!("unique constraint violated: {detail}"))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                return Self::Conflict(format!("foreign key constraint violated: {detail}"))
            }
            _ => {}
        }
        match e {
            DbErr::RecordNotFound(what) => Self::NotFound(what),
            DbErr::RecordNotUpdated => Self::NotFound("record no longer exists".into()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Foreign-key failures on a child write mean the parent vanished between the
/// existence check and the write.
pub(crate) fn parent_gone(e: DbErr, label: &str, key: impl Display) -> ServiceError {
    match e.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => ServiceError::not_found(label, key),
        _ => e.into(),
    }
}
