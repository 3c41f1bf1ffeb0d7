//! Operation error types

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised by request handlers
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Body is not a JSON object
    #[error("Invalid body (JSON): {0}")]
    InvalidBody(String),

    /// A required field or parameter is absent
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A field is present but unusable
    #[error("{field} {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    /// No recognized field was supplied for an update
    #[error("No fields to update")]
    EmptyUpdate,

    /// The store rejected or failed the call
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HandlerError {
    /// Whether the caller caused the error
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
