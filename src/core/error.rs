//! Error types for strata.

use crate::core::types::TypeId;
use std::sync::PoisonError;
use thiserror::Error;

/// Result type alias for strata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while declaring or composing plugin types.
#[derive(Error, Debug)]
pub enum Error {
    // Declaration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown type: {0}")]
    UnknownType(TypeId),

    #[error("Registry has been dropped")]
    RegistryDropped,

    // Composition errors
    #[error("Composition error: {0}")]
    Composition(String),

    // Dispatch errors
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Returned by user behaviors to report a failed call. Dispatch passes
    /// it through to the caller unchanged.
    #[error("Plugin call failed: {0}")]
    CallFailed(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // Generic errors
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this is a declaration-time configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Whether this is a linearization failure.
    pub fn is_composition(&self) -> bool {
        matches!(self, Error::Composition(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Error::LockPoisoned(err.to_string())
    }
}
