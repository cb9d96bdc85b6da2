//! Session state and its manager.
//!
//! [`SessionManager`] is the sole authority over the [`Session`]: the UI and
//! the permission queries only ever read it. Every operation leaves the
//! session in a consistent snapshot — there is no observable intermediate
//! state — and writes the whitelisted fields through to the persister before
//! returning.
//!
//! Overlapping mutating operations are ruled out by construction: every
//! mutating method takes `&mut self`, so the exclusive borrow is the
//! single-flight guard.

pub mod persist;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{AuthError, permissions, token};
use crate::backend::AuthBackend;
use crate::models::auth::{Action, LoginCredentials, Module, Resource, User, UserPatch};
use self::persist::{PersistedSession, SessionPersister};

/// The authoritative client-side authentication state.
///
/// Invariant: `is_authenticated` implies both `user` and `token` are
/// present. Every mutation path in [`SessionManager`] preserves it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    /// Message from the most recent failed operation; never persisted.
    pub last_error: Option<String>,
}

/// Coarse lifecycle phase, for UI gating and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    LoggedOut,
    Authenticating,
    Authenticated,
    Refreshing,
}

/// Orchestrates login, logout, expiry detection, refresh, and re-validation
/// against an injected auth-service boundary and persister.
pub struct SessionManager {
    session: Session,
    phase: SessionPhase,
    backend: Arc<dyn AuthBackend>,
    persister: Box<dyn SessionPersister>,
}

impl SessionManager {
    /// A manager with an empty, logged-out session.
    pub fn new(backend: Arc<dyn AuthBackend>, persister: Box<dyn SessionPersister>) -> Self {
        Self {
            session: Session::default(),
            phase: SessionPhase::LoggedOut,
            backend,
            persister,
        }
    }

    /// Startup path: seed the session from the persisted snapshot, then
    /// validate it. Ends authenticated only if the stored token survives
    /// `check_auth`.
    pub async fn restore(
        backend: Arc<dyn AuthBackend>,
        persister: Box<dyn SessionPersister>,
    ) -> Self {
        let mut manager = Self::new(backend, persister);
        match manager.persister.load() {
            Ok(Some(snapshot)) => {
                // Never trust a stored authenticated flag beyond what the
                // stored fields can back up.
                let is_authenticated =
                    snapshot.is_authenticated && snapshot.user.is_some() && snapshot.token.is_some();
                manager.session = Session {
                    user: snapshot.user,
                    token: snapshot.token,
                    refresh_token: snapshot.refresh_token,
                    is_authenticated,
                    last_error: None,
                };
                if is_authenticated {
                    manager.phase = SessionPhase::Authenticated;
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not load persisted session"),
        }
        if manager.session.token.is_some() {
            manager.check_auth().await;
        }
        manager
    }

    // -----------------------------------------------------------------------
    // Read-only views
    // -----------------------------------------------------------------------

    /// The current state snapshot.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated
    }

    pub fn last_error(&self) -> Option<&str> {
        self.session.last_error.as_deref()
    }

    /// Whether the current token is inside the 5-minute expiry margin.
    /// No token counts as expired.
    pub fn is_token_expired(&self) -> bool {
        match &self.session.token {
            Some(tok) => token::is_expired(tok),
            None => true,
        }
    }

    // -----------------------------------------------------------------------
    // Permission queries
    // -----------------------------------------------------------------------

    /// Exact-match permission check; `false` when logged out.
    pub fn has_permission(&self, resource: Resource, action: Action) -> bool {
        permissions::has_permission(self.user(), resource, action)
    }

    pub fn has_any_permission(&self, pairs: &[(Resource, Action)]) -> bool {
        permissions::has_any_permission(self.user(), pairs)
    }

    pub fn has_all_permissions(&self, pairs: &[(Resource, Action)]) -> bool {
        permissions::has_all_permissions(self.user(), pairs)
    }

    pub fn can_access_module(&self, module: Module) -> bool {
        permissions::can_access_module(self.user(), module)
    }

    // -----------------------------------------------------------------------
    // State transitions
    // -----------------------------------------------------------------------

    /// Authenticate with the boundary.
    ///
    /// On success the session holds the returned user and token pair. On
    /// failure the session is fully cleared, `last_error` records the
    /// reason, and the error is re-raised for the caller's feedback.
    pub async fn login(&mut self, credentials: &LoginCredentials) -> Result<(), AuthError> {
        self.phase = SessionPhase::Authenticating;
        self.session.last_error = None;

        match self.backend.login(credentials).await {
            Ok(response) => match self.apply_authenticated(
                response.user,
                response.token,
                response.refresh_token,
            ) {
                Ok(()) => {
                    info!(username = %credentials.username, "login succeeded");
                    Ok(())
                }
                Err(e) => {
                    self.fail_authentication(&e);
                    Err(e)
                }
            },
            Err(e) => {
                self.fail_authentication(&e);
                Err(e)
            }
        }
    }

    /// Clear the session locally and fire a best-effort server-side
    /// invalidation. Idempotent; never fails.
    pub fn logout(&mut self) {
        // The invalidation call must not block local logout, so it runs
        // detached. Outside a runtime (pure unit tests) it is skipped.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let backend = Arc::clone(&self.backend);
            let token = self.session.token.clone();
            handle.spawn(async move {
                if let Err(e) = backend.logout(token.as_deref()).await {
                    debug!(error = %e, "server-side logout failed");
                }
            });
        }

        self.session = Session::default();
        self.phase = SessionPhase::LoggedOut;
        self.persist();
    }

    /// Passive re-validation. Never surfaces an error: a failure here is
    /// recovered by de-authenticating, not reported.
    pub async fn check_auth(&mut self) {
        let Some(tok) = self.session.token.clone() else {
            self.session.is_authenticated = false;
            self.phase = SessionPhase::LoggedOut;
            self.persist();
            return;
        };

        if token::is_expired(&tok) {
            if let Err(e) = self.refresh_auth().await {
                // refresh_auth already cleared the session.
                warn!(error = %e, "refresh during re-validation failed");
            }
            return;
        }

        match self.backend.current_user(&tok).await {
            Ok(user) if user.is_active => {
                self.session.user = Some(user);
                self.session.is_authenticated = true;
                self.phase = SessionPhase::Authenticated;
                self.persist();
            }
            Ok(user) => {
                warn!(username = %user.username, "re-validation returned an inactive user");
                self.logout();
            }
            Err(e) => {
                warn!(error = %e, "session re-validation failed");
                self.logout();
            }
        }
    }

    /// Exchange the stored refresh token for a fresh pair.
    ///
    /// Fails immediately, without contacting the boundary, when no refresh
    /// token is stored; the session is cleared all the same, so a stale
    /// token can never outlive a failed refresh. Any boundary failure also
    /// logs the session out before the error is re-raised.
    pub async fn refresh_auth(&mut self) -> Result<(), AuthError> {
        let Some(refresh) = self.session.refresh_token.clone() else {
            self.logout();
            return Err(AuthError::MissingRefreshToken);
        };
        self.phase = SessionPhase::Refreshing;

        match self.backend.refresh(&refresh).await {
            Ok(response) => match self.apply_authenticated(
                response.user,
                response.token,
                response.refresh_token,
            ) {
                Ok(()) => Ok(()),
                Err(e) => {
                    self.logout();
                    Err(e)
                }
            },
            Err(e) => {
                self.logout();
                Err(e)
            }
        }
    }

    /// Shallow-merge profile fields into the current user. No-op when
    /// logged out.
    pub fn update_user(&mut self, patch: UserPatch) {
        if let Some(user) = self.session.user.as_mut() {
            user.apply(patch);
            self.persist();
        }
    }

    /// Drop the recorded error message.
    pub fn clear_error(&mut self) {
        self.session.last_error = None;
    }

    // -----------------------------------------------------------------------
    // Account operations forwarded to the boundary
    // -----------------------------------------------------------------------

    /// Change the current user's password. Requires a live session.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let token = self
            .session
            .token
            .as_deref()
            .ok_or(AuthError::CredentialError)?;
        self.backend
            .change_password(token, current_password, new_password)
            .await
    }

    /// Request a password-reset mail for an address.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.backend.request_password_reset(email).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Install an authenticated session. An inactive user is rejected here
    /// regardless of what the boundary returned.
    fn apply_authenticated(
        &mut self,
        user: User,
        token: String,
        refresh_token: String,
    ) -> Result<(), AuthError> {
        if !user.is_active {
            return Err(AuthError::InactiveAccount(user.username.clone()));
        }
        self.session = Session {
            user: Some(user),
            token: Some(token),
            refresh_token: Some(refresh_token),
            is_authenticated: true,
            last_error: None,
        };
        self.phase = SessionPhase::Authenticated;
        self.persist();
        Ok(())
    }

    /// Failed active authentication: clear everything, keep the reason.
    fn fail_authentication(&mut self, error: &AuthError) {
        self.session = Session {
            last_error: Some(error.to_string()),
            ..Session::default()
        };
        self.phase = SessionPhase::LoggedOut;
        self.persist();
    }

    /// Write the whitelisted fields through to the persister.
    fn persist(&self) {
        let snapshot = PersistedSession {
            user: self.session.user.clone(),
            token: self.session.token.clone(),
            refresh_token: self.session.refresh_token.clone(),
            is_authenticated: self.session.is_authenticated,
        };
        if let Err(e) = self.persister.save(&snapshot) {
            // A failed write only affects the next restart.
            warn!(error = %e, "could not persist session snapshot");
        }
    }
}
