//! The module contains the errors the engine can return.
//!
//! The errors are:
//!
//! - [`InvalidAmount`] returned when a monetary value cannot be parsed.
//! - [`MalformedCollection`] returned when a list payload is not a collection
//!   of records.
//! - [`InvalidFilter`] returned when a list is filtered on a field its
//!   resource does not expose.
//! - [`NotSignedIn`] returned when a call needs a session and there is none.
//! - [`Validation`] returned when a form fails its checks.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`MalformedCollection`]: EngineError::MalformedCollection
//!  [`InvalidFilter`]: EngineError::InvalidFilter
//!  [`NotSignedIn`]: EngineError::NotSignedIn
//!  [`Validation`]: EngineError::Validation
use thiserror::Error;

use crate::validation::FieldErrors;

/// Engine custom errors.
#[derive(Error, Debug, PartialEq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Malformed collection: {0}")]
    MalformedCollection(String),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
}
