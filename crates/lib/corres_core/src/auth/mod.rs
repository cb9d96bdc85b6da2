//! Authentication and authorization logic.
//!
//! Token decoding and expiry policy, permission evaluation, and the
//! credential validation rules shared by front-ends of the console.

pub mod permissions;
pub mod token;
pub mod validation;

use thiserror::Error;

/// Authentication errors.
///
/// `TokenError` is an internal condition — callers treat an undecodable token
/// exactly like an expired one and never surface it to the end user.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Inactive account: {0}")]
    InactiveAccount(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth service unavailable: {0}")]
    BoundaryError(String),

    #[error("Session storage error: {0}")]
    StorageError(String),
}
