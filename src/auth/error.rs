//! Error types for authorization checks.

use super::guard::Operation;
use thiserror::Error;

/// Errors returned by the authorization guard.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    /// No authenticated principal was supplied.
    #[error("authentication is required")]
    Unauthenticated,

    /// The principal is authenticated but lacks a required role.
    #[error("caller lacks a required role for {operation}")]
    Forbidden {
        /// Operation the caller attempted.
        operation: Operation,
    },
}

impl AccessError {
    /// Returns the HTTP status code conventionally mapped to this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Forbidden { .. } => 403,
        }
    }
}
