//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`NotFound`] thrown when a catalog item or account is missing.
//! - [`AlreadyExists`] thrown when a catalog branch or item is already taken.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`AlreadyExists`]: EngineError::AlreadyExists
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("\"{0}\" already present!")]
    AlreadyExists(String),
    #[error("Insufficient stars: {0}")]
    InsufficientFunds(String),
    #[error("Empty paper set: {0}")]
    EmptySet(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::AlreadyExists(a), Self::AlreadyExists(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::EmptySet(a), Self::EmptySet(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::MalformedPayload(a), Self::MalformedPayload(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
