//! Error type for persistence and service operations.

use thiserror::Error;

use stockkeep_auth::{AuthError, AuthzError};
use stockkeep_core::DomainError;

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Failure of a store or service operation.
///
/// Domain and auth failures pass through unchanged so callers can match on
/// them; everything the database reports is flattened into `Storage`.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("storage error: {0}")]
    Storage(String),

    /// A persisted row could not be decoded into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// A background task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(String),
}

impl InventoryError {
    /// The domain error, if this failure is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            InventoryError::Domain(e) => Some(e),
            _ => None,
        }
    }
}
