//! # Errors
//!
//! Centralized error handling for the catalog engine.
//! `DomainError` is what services surface to callers; `StoreError` is what
//! ports report back to services.

use thiserror::Error;

/// The primary error type for all service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Nothing matched after every fallback strategy
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested moderation or lifecycle move is not allowed from here
    #[error("illegal transition: {0}")]
    IllegalTransition(String),

    /// No valid caller identity was presented
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The actor lacks the role or ownership the action needs
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed input (e.g. managed target without a UUID)
    #[error("validation error: {0}")]
    Validation(String),

    /// Unique constraint still violated after the single retry
    #[error("conflict: {0}")]
    Conflict(String),

    /// Every source a read depends on is down
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Infrastructure failure
    #[error("internal service error: {0}")]
    Internal(String),
}

/// Errors reported by storage ports.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("slug '{0}' is already taken")]
    DuplicateSlug(String),

    #[error("legacy entry '{0}' is already claimed")]
    DuplicateClaim(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateSlug(slug) => {
                DomainError::Conflict(format!("slug '{slug}' is already taken"))
            }
            StoreError::DuplicateClaim(id) => {
                DomainError::Conflict(format!("legacy entry '{id}' is already claimed"))
            }
            StoreError::NotFound(what) => DomainError::NotFound(what),
            StoreError::Backend(e) => DomainError::Internal(e.to_string()),
        }
    }
}

/// Errors from the notification port. Never propagated into the triggering write.
#[derive(Error, Debug)]
#[error("notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// A specialized Result type for catalog logic.
pub type Result<T> = std::result::Result<T, DomainError>;
