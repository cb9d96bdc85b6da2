//! In-memory mock auth service.
//!
//! Ships the development directory of the console: the system permission
//! catalogue, the five roles, and the seeded accounts with their dev
//! credentials. Issues unsigned mock tokens (24 h lifetime) and honours the
//! same failure modes as the real service — wrong credentials, inactive
//! accounts, undecodable refresh tokens.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use super::AuthBackend;
use crate::auth::{AuthError, token};
use crate::models::auth::{
    Action, AuthResponse, LoginCredentials, Permission, Resource, Role, TokenClaims, User,
};

/// Mock token lifetime: 24 hours.
const TOKEN_EXPIRY_SECS: i64 = 24 * 60 * 60;

/// Mock refresh tokens are the access token behind this prefix.
const REFRESH_PREFIX: &str = "refresh_";

/// bcrypt cost for the seeded dev credentials. The minimum: the directory is
/// rebuilt for every test and nothing here protects real secrets.
const BCRYPT_COST: u32 = 4;

/// The full permission catalogue of the console.
pub fn system_permissions() -> Vec<Permission> {
    let p = Permission::new;
    vec![
        p("1", "Ver correspondencia", Resource::Correspondence, Action::Read),
        p("2", "Crear correspondencia", Resource::Correspondence, Action::Create),
        p("3", "Editar correspondencia", Resource::Correspondence, Action::Update),
        p("4", "Eliminar correspondencia", Resource::Correspondence, Action::Delete),
        p("5", "Turnar correspondencia", Resource::Correspondence, Action::Route),
        p("6", "Cerrar correspondencia", Resource::Correspondence, Action::Close),
        p("7", "Ver expedientes", Resource::FileUnit, Action::Read),
        p("8", "Crear expedientes", Resource::FileUnit, Action::Create),
        p("9", "Ver préstamos", Resource::Loan, Action::Read),
        p("10", "Autorizar préstamos", Resource::Loan, Action::Authorize),
        p("11", "Administrar usuarios", Resource::User, Action::Manage),
        p("12", "Ver auditoría", Resource::Audit, Action::Read),
    ]
}

/// The five system roles, as filtered views of the permission catalogue.
pub fn system_roles() -> Vec<Arc<Role>> {
    let all = system_permissions();
    let filtered = |pred: &dyn Fn(&Permission) -> bool| -> Vec<Permission> {
        all.iter().filter(|p| pred(p)).cloned().collect()
    };

    vec![
        Arc::new(Role {
            id: "admin".into(),
            name: "Administrador".into(),
            permissions: all.clone(),
        }),
        Arc::new(Role {
            id: "mesa-entrada".into(),
            name: "Mesa de Entrada".into(),
            permissions: filtered(&|p| {
                p.resource == Resource::Correspondence
                    && matches!(
                        p.action,
                        Action::Read | Action::Create | Action::Update | Action::Route
                    )
            }),
        }),
        Arc::new(Role {
            id: "responsable".into(),
            name: "Responsable de Área".into(),
            permissions: filtered(&|p| {
                matches!(p.resource, Resource::Correspondence | Resource::FileUnit)
            }),
        }),
        Arc::new(Role {
            id: "archivista".into(),
            name: "Archivista".into(),
            permissions: filtered(&|p| {
                matches!(
                    p.resource,
                    Resource::Correspondence | Resource::FileUnit | Resource::Loan
                )
            }),
        }),
        Arc::new(Role {
            id: "consultor".into(),
            name: "Consultor".into(),
            permissions: filtered(&|p| p.action == Action::Read),
        }),
    ]
}

/// Seeded accounts plus their dev passwords.
fn seed_accounts(roles: &[Arc<Role>]) -> Vec<(User, &'static str)> {
    let role = |id: &str| {
        roles
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .unwrap_or_else(|| roles[0].clone())
    };
    let user = |id: &str,
                username: &str,
                email: &str,
                first: &str,
                last: &str,
                role_id: &str,
                area: &str,
                active: bool| User {
        id: id.into(),
        username: username.into(),
        email: email.into(),
        first_name: first.into(),
        last_name: last.into(),
        role: role(role_id),
        area: area.into(),
        is_active: active,
    };

    vec![
        (
            user(
                "admin-001",
                "admin",
                "admin@correspondencia.gov",
                "Carlos",
                "Administrador",
                "admin",
                "Sistemas",
                true,
            ),
            "admin123",
        ),
        (
            user(
                "mesa-001",
                "mesa.entrada",
                "mesa@correspondencia.gov",
                "María",
                "González",
                "mesa-entrada",
                "Mesa de Entrada",
                true,
            ),
            "mesa123",
        ),
        (
            user(
                "resp-001",
                "resp.juridica",
                "juridica@correspondencia.gov",
                "Ana",
                "Martínez",
                "responsable",
                "Área Jurídica",
                true,
            ),
            "juridica123",
        ),
        (
            user(
                "resp-002",
                "resp.rrhh",
                "rrhh@correspondencia.gov",
                "Luis",
                "Rodríguez",
                "responsable",
                "Recursos Humanos",
                true,
            ),
            "rrhh123",
        ),
        (
            user(
                "arch-001",
                "archivista",
                "archivo@correspondencia.gov",
                "Patricia",
                "López",
                "archivista",
                "Archivo Central",
                true,
            ),
            "archivo123",
        ),
        // Disabled account, kept for the inactive-login paths.
        (
            user(
                "cons-001",
                "consultor.externo",
                "consultor@correspondencia.gov",
                "Elena",
                "Suárez",
                "consultor",
                "Consultoría Externa",
                false,
            ),
            "consultor123",
        ),
    ]
}

/// Mock implementation of [`AuthBackend`] over an in-memory directory.
pub struct MockAuthBackend {
    users: Vec<User>,
    /// username → bcrypt hash of the dev password.
    credentials: HashMap<String, String>,
    /// Simulated round-trip latency applied to every call.
    latency: Duration,
}

impl MockAuthBackend {
    /// Build the directory with the seeded accounts and no latency.
    pub fn new() -> Self {
        let roles = system_roles();
        let mut users = Vec::new();
        let mut credentials = HashMap::new();
        for (user, password) in seed_accounts(&roles) {
            match bcrypt::hash(password, BCRYPT_COST) {
                Ok(hash) => {
                    credentials.insert(user.username.clone(), hash);
                }
                // The account stays listed but cannot log in.
                Err(e) => warn!(username = %user.username, error = %e,
                    "seeded password could not be hashed"),
            }
            users.push(user);
        }
        Self {
            users,
            credentials,
            latency: Duration::ZERO,
        }
    }

    /// Simulate network latency on every boundary call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn user_by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Verify a username/password pair against the directory.
    pub fn find_user_by_credentials(&self, username: &str, password: &str) -> Option<&User> {
        let hash = self.credentials.get(username)?;
        if !bcrypt::verify(password, hash).unwrap_or(false) {
            return None;
        }
        self.users.iter().find(|u| u.username == username)
    }

    /// Active users assigned to an area.
    pub fn users_by_area(&self, area: &str) -> Vec<&User> {
        self.users
            .iter()
            .filter(|u| u.is_active && u.area == area)
            .collect()
    }

    /// Case-insensitive text search over active users.
    pub fn search_users(&self, query: &str) -> Vec<&User> {
        let query = query.to_lowercase();
        self.users
            .iter()
            .filter(|u| {
                u.is_active
                    && (u.first_name.to_lowercase().contains(&query)
                        || u.last_name.to_lowercase().contains(&query)
                        || u.username.to_lowercase().contains(&query)
                        || u.email.to_lowercase().contains(&query)
                        || u.area.to_lowercase().contains(&query))
            })
            .collect()
    }

    fn issue_tokens(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role.name.clone(),
            area: user.area.clone(),
            iat: now,
            exp: now + TOKEN_EXPIRY_SECS,
        };
        let access = token::encode_mock(&claims)?;
        let refresh = format!("{REFRESH_PREFIX}{access}");
        Ok(AuthResponse {
            user: user.clone(),
            token: access,
            refresh_token: refresh,
            expires_in: TOKEN_EXPIRY_SECS,
        })
    }
}

impl Default for MockAuthBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, AuthError> {
        self.delay().await;

        let user = self
            .find_user_by_credentials(&credentials.username, &credentials.password)
            .ok_or(AuthError::CredentialError)?;
        if !user.is_active {
            return Err(AuthError::InactiveAccount(user.username.clone()));
        }
        info!(username = %user.username, "mock login");
        self.issue_tokens(user)
    }

    async fn logout(&self, _token: Option<&str>) -> Result<(), AuthError> {
        self.delay().await;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        self.delay().await;

        let access = refresh_token
            .strip_prefix(REFRESH_PREFIX)
            .ok_or_else(|| AuthError::TokenError("not a refresh token".into()))?;
        let claims = token::decode(access)?;
        let user = self
            .user_by_id(&claims.sub)
            .ok_or(AuthError::CredentialError)?;
        if !user.is_active {
            return Err(AuthError::InactiveAccount(user.username.clone()));
        }
        self.issue_tokens(user)
    }

    async fn current_user(&self, token: &str) -> Result<User, AuthError> {
        self.delay().await;

        let claims = token::decode(token)?;
        let user = self
            .user_by_id(&claims.sub)
            .ok_or(AuthError::CredentialError)?;
        if !user.is_active {
            return Err(AuthError::InactiveAccount(user.username.clone()));
        }
        Ok(user.clone())
    }

    async fn change_password(
        &self,
        _token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.delay().await;

        if current_password.chars().count() < 6 || new_password.chars().count() < 6 {
            return Err(AuthError::ValidationError(
                "Contraseña debe tener al menos 6 caracteres".into(),
            ));
        }
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.delay().await;

        // Silent for unknown addresses so the call does not leak which
        // emails exist.
        if self.users.iter().any(|u| u.email == email) {
            info!(email, "mock password reset mail sent");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_with_seeded_credentials() {
        let backend = MockAuthBackend::new();
        let response = backend
            .login(&LoginCredentials {
                username: "admin".into(),
                password: "admin123".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.user.username, "admin");
        assert_eq!(response.expires_in, TOKEN_EXPIRY_SECS);
        assert!(response.refresh_token.starts_with(REFRESH_PREFIX));

        let claims = token::decode(&response.token).unwrap();
        assert_eq!(claims.sub, "admin-001");
        assert_eq!(claims.role, "Administrador");
    }

    #[tokio::test]
    async fn every_seeded_credential_verifies() {
        let backend = MockAuthBackend::new();
        for (username, password) in [
            ("admin", "admin123"),
            ("mesa.entrada", "mesa123"),
            ("resp.juridica", "juridica123"),
            ("resp.rrhh", "rrhh123"),
            ("archivista", "archivo123"),
        ] {
            let response = backend
                .login(&LoginCredentials {
                    username: username.into(),
                    password: password.into(),
                })
                .await
                .unwrap();
            assert_eq!(response.user.username, username);
        }

        // The disabled account's hash works too: it must fail on the
        // active check, never on the password.
        let err = backend
            .login(&LoginCredentials {
                username: "consultor.externo".into(),
                password: "consultor123".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InactiveAccount(_)));
    }

    #[tokio::test]
    async fn wrong_password_is_a_credential_error() {
        let backend = MockAuthBackend::new();
        let err = backend
            .login(&LoginCredentials {
                username: "admin".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::CredentialError));
    }

    #[tokio::test]
    async fn inactive_account_cannot_login() {
        let backend = MockAuthBackend::new();
        let err = backend
            .login(&LoginCredentials {
                username: "consultor.externo".into(),
                password: "consultor123".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InactiveAccount(_)));
    }

    #[tokio::test]
    async fn refresh_rotates_the_token_pair() {
        let backend = MockAuthBackend::new();
        let first = backend
            .login(&LoginCredentials {
                username: "archivista".into(),
                password: "archivo123".into(),
            })
            .await
            .unwrap();

        let second = backend.refresh(&first.refresh_token).await.unwrap();
        assert_eq!(second.user.id, first.user.id);
        assert!(token::decode(&second.token).is_ok());
    }

    #[tokio::test]
    async fn refresh_rejects_garbage() {
        let backend = MockAuthBackend::new();
        assert!(matches!(
            backend.refresh("not-a-refresh-token").await,
            Err(AuthError::TokenError(_))
        ));
        assert!(matches!(
            backend.refresh("refresh_garbage").await,
            Err(AuthError::TokenError(_))
        ));
    }

    #[tokio::test]
    async fn current_user_rejects_inactive_accounts() {
        let backend = MockAuthBackend::new();
        // Forge a token for the disabled account; the directory must still
        // refuse to resolve it.
        let now = Utc::now().timestamp();
        let forged = token::encode_mock(&TokenClaims {
            sub: "cons-001".into(),
            username: "consultor.externo".into(),
            role: "Consultor".into(),
            area: "Consultoría Externa".into(),
            iat: now,
            exp: now + TOKEN_EXPIRY_SECS,
        })
        .unwrap();

        assert!(matches!(
            backend.current_user(&forged).await,
            Err(AuthError::InactiveAccount(_))
        ));
    }

    #[test]
    fn directory_lookups() {
        let backend = MockAuthBackend::new();
        assert_eq!(backend.users_by_area("Mesa de Entrada").len(), 1);
        // The disabled consultor is filtered out everywhere.
        assert!(backend.users_by_area("Consultoría Externa").is_empty());
        assert!(backend.search_users("suárez").is_empty());

        let hits = backend.search_users("GONZÁLEZ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "mesa.entrada");
    }

    #[test]
    fn roles_filter_the_catalogue() {
        let roles = system_roles();
        let by_id = |id: &str| roles.iter().find(|r| r.id == id).unwrap();

        assert_eq!(by_id("admin").permissions.len(), 12);
        assert_eq!(by_id("mesa-entrada").permissions.len(), 4);
        assert!(by_id("mesa-entrada").grants(Resource::Correspondence, Action::Route));
        assert!(!by_id("mesa-entrada").grants(Resource::Correspondence, Action::Delete));
        assert!(by_id("consultor").grants(Resource::Audit, Action::Read));
        assert!(!by_id("consultor").grants(Resource::Correspondence, Action::Create));
    }
}
