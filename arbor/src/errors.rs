//! Service-level error taxonomy.
//!
//! The generic service lets every error propagate unchanged; mapping to transport status codes is
//! the caller's job. [`Error::kind`] gives callers a stable classification to map from without
//! this crate depending on any transport.

use crate::db::errors::DbError;
use crate::types::Operation;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// The entity kind doesn't support the operation
    #[error("Cannot {operation} {resource}: {reason}")]
    Forbidden {
        operation: Operation,
        resource: String,
        reason: String,
    },

    /// The caller handed in an entity that doesn't match stored state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Invalid query or request parameters
    #[error("{message}")]
    BadRequest { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Backend operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of an [`Error`], for presentation-layer mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidState,
    BadRequest,
    Conflict,
    Internal,
}

impl Error {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Forbidden { .. } => ErrorKind::Forbidden,
            Error::InvalidState { .. } => ErrorKind::InvalidState,
            Error::BadRequest { .. } => ErrorKind::BadRequest,
            Error::Internal { .. } => ErrorKind::Internal,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => ErrorKind::NotFound,
                DbError::UnknownColumn { .. } => ErrorKind::BadRequest,
                DbError::UniqueViolation { .. } => ErrorKind::Conflict,
                DbError::ForeignKeyViolation { .. } => ErrorKind::Conflict,
                DbError::CheckViolation { .. } => ErrorKind::BadRequest,
                DbError::Other(_) => ErrorKind::Internal,
            },
            Error::Other(_) => ErrorKind::Internal,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Forbidden {
                operation,
                resource,
                reason,
            } => format!("Cannot {operation} {resource}: {reason}"),
            Error::InvalidState { message } => message.clone(),
            Error::BadRequest { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UnknownColumn { column, .. } => format!("Unknown field '{column}'"),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => {
                    "Resource is still referenced by other resources".to_string()
                }
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
