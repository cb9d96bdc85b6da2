//! The auth-service boundary.
//!
//! The session manager never talks to a server directly; it goes through
//! [`AuthBackend`], an opaque async dependency that either returns session
//! data or fails with an [`AuthError`]. Two implementations ship with the
//! crate: an in-memory mock directory and a `reqwest`-backed HTTP client.

pub mod http;
pub mod mock;

use async_trait::async_trait;

use crate::auth::AuthError;
use crate::models::auth::{AuthResponse, LoginCredentials, User};

/// Async boundary to the authentication service.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a user plus a token pair.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, AuthError>;

    /// Invalidate the server-side session. Callers treat failure as
    /// best-effort and never block on it.
    async fn logout(&self, token: Option<&str>) -> Result<(), AuthError>;

    /// Exchange a refresh token for a fresh token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError>;

    /// Look up the user a bearer token belongs to.
    async fn current_user(&self, token: &str) -> Result<User, AuthError>;

    /// Change the password of the token's user.
    async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Request a password-reset mail. Succeeds silently for unknown
    /// addresses so the endpoint does not leak which emails exist.
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;
}
