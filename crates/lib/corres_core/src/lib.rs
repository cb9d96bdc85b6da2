//! # corres_core
//!
//! Session, token, and permission core for the Correspondencia
//! document-tracking console.
//!
//! The crate owns the client-side authentication contract: a
//! [`session::SessionManager`] orchestrating login/logout/refresh against an
//! injected [`backend::AuthBackend`], the unverified bearer-token codec and
//! its 5-minute expiry margin ([`auth::token`]), exact-match permission
//! evaluation ([`auth::permissions`]), and the write-through persistence of
//! session snapshots ([`session::persist`]).

pub mod auth;
pub mod backend;
pub mod models;
pub mod session;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
