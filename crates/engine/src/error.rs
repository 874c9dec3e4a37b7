//! The module contains the errors the engine can throw.
//!
//! Every variant collapses onto one [`ErrorKind`], which is what the API layer
//! maps to a transport status:
//!
//! - [`KeyNotFound`] the entity is absent or not visible to the caller.
//! - [`ExistingKey`] and [`Conflict`] uniqueness, overlap or in-use violations.
//! - [`Forbidden`] the operation is not allowed on this entity class.
//! - every `Invalid*` variant and [`InactiveGoal`] are semantic validation failures.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Conflict`]: EngineError::Conflict
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`InactiveGoal`]: EngineError::InactiveGoal
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Inactive goal: {0}")]
    InactiveGoal(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Caller-facing classification of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidArgument,
    Forbidden,
    /// Storage failure not interpreted by the engine.
    Persistence,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::ExistingKey(_) | Self::Conflict(_) => ErrorKind::Conflict,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidAmount(_)
            | Self::InvalidDate(_)
            | Self::InvalidThreshold(_)
            | Self::InvalidTransition(_)
            | Self::InvalidCategory(_)
            | Self::InactiveGoal(_)
            | Self::InvalidName(_)
            | Self::InvalidArgument(_)
            | Self::InvalidId(_) => ErrorKind::InvalidArgument,
            Self::Database(_) => ErrorKind::Persistence,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidThreshold(a), Self::InvalidThreshold(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::InvalidCategory(a), Self::InvalidCategory(b)) => a == b,
            (Self::InactiveGoal(a), Self::InactiveGoal(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidArgument(a), Self::InvalidArgument(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
