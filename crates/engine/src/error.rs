//! The module contains the errors the engine can throw.
//!
//! [`Validation`] carries the name of the offending input field so the server
//! can render field-keyed error bodies; [`KeyNotFound`] deliberately covers
//! both "no such record" and "record owned by someone else".
//!
//!  [`Validation`]: EngineError::Validation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("\"{0}\" not found!")]
    KeyNotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Validation {
                    field: a_field,
                    message: a_message,
                },
                Self::Validation {
                    field: b_field,
                    message: b_message,
                },
            ) => a_field == b_field && a_message == b_message,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
