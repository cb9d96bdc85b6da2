//! Authentication and authorization domain models.
//!
//! Wire-facing types carry `#[serde(rename_all = "camelCase")]` because the
//! auth service and the persisted session snapshot both speak camelCase JSON.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// A protected resource of the console.
///
/// Closed set: permission grants always name one of these, never a free-form
/// string, so a typo in a grant is a compile error rather than a silent deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    /// Incoming/outgoing correspondence records.
    Correspondence,
    /// File units ("expedientes").
    FileUnit,
    /// Document loans.
    Loan,
    /// User administration.
    User,
    /// Audit trail.
    Audit,
}

impl Resource {
    /// Wire name of the resource (kebab-case).
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Correspondence => "correspondence",
            Resource::FileUnit => "file-unit",
            Resource::Loan => "loan",
            Resource::User => "user",
            Resource::Audit => "audit",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "correspondence" => Ok(Resource::Correspondence),
            "file-unit" => Ok(Resource::FileUnit),
            "loan" => Ok(Resource::Loan),
            "user" => Ok(Resource::User),
            "audit" => Ok(Resource::Audit),
            other => Err(AuthError::ValidationError(format!(
                "unknown resource: {other}"
            ))),
        }
    }
}

/// An action a role may be granted on a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Route correspondence to another area ("turnar").
    Route,
    Close,
    /// Authorize a loan.
    Authorize,
    /// Administer users.
    Manage,
}

impl Action {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Route => "route",
            Action::Close => "close",
            Action::Authorize => "authorize",
            Action::Manage => "manage",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "route" => Ok(Action::Route),
            "close" => Ok(Action::Close),
            "authorize" => Ok(Action::Authorize),
            "manage" => Ok(Action::Manage),
            other => Err(AuthError::ValidationError(format!(
                "unknown action: {other}"
            ))),
        }
    }
}

/// A single permission grant: exactly one `(resource, action)` pair.
///
/// No wildcards and no hierarchy — a grant matches only its own pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    /// Human-readable label, e.g. "Ver correspondencia".
    pub name: String,
    pub resource: Resource,
    pub action: Action,
}

impl Permission {
    pub fn new(id: &str, name: &str, resource: Resource, action: Action) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            resource,
            action,
        }
    }
}

/// A named bundle of permissions.
///
/// Set semantics: entries are unique by `(resource, action)`; order carries
/// no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Whether this role holds an exact `(resource, action)` grant.
    pub fn grants(&self, resource: Resource, action: Action) -> bool {
        self.permissions
            .iter()
            .any(|p| p.resource == resource && p.action == action)
    }
}

/// Domain user: identity plus authorization.
///
/// The role is shared by reference — several users (and the persisted
/// snapshot) point at the same `Role` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Arc<Role>,
    pub area: String,
    pub is_active: bool,
}

impl User {
    /// "Nombre Apellido", as rendered in the console header.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Upper-case initials for the avatar badge.
    pub fn initials(&self) -> String {
        let mut out = String::new();
        if let Some(c) = self.first_name.chars().next() {
            out.extend(c.to_uppercase());
        }
        if let Some(c) = self.last_name.chars().next() {
            out.extend(c.to_uppercase());
        }
        out
    }
}

/// Shallow patch applied to a [`User`] in place; `None` fields are left
/// untouched. The role is replaced wholesale when present, never merged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub area: Option<String>,
    pub role: Option<Arc<Role>>,
    pub is_active: Option<bool>,
}

impl User {
    /// Apply a shallow patch.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(area) = patch.area {
            self.area = area;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }
}

/// Claims embedded in a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — user ID (standard `sub` claim).
    pub sub: String,
    pub username: String,
    /// Role name (display form, e.g. "Administrador").
    pub role: String,
    pub area: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Username/password pair submitted to `login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Successful response from the auth service for `login` and `refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub refresh_token: String,
    /// Nominal token lifetime in seconds.
    pub expires_in: i64,
}

/// Navigable modules of the console, for coarse UI gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Correspondence,
    Archive,
    Loans,
    Admin,
}

impl Module {
    /// The permission that gates entry to the module.
    pub fn required_permission(&self) -> (Resource, Action) {
        match self {
            Module::Correspondence => (Resource::Correspondence, Action::Read),
            Module::Archive => (Resource::FileUnit, Action::Read),
            Module::Loans => (Resource::Loan, Action::Read),
            Module::Admin => (Resource::User, Action::Manage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_role() -> Arc<Role> {
        Arc::new(Role {
            id: "consultor".into(),
            name: "Consultor".into(),
            permissions: vec![Permission::new(
                "1",
                "Ver correspondencia",
                Resource::Correspondence,
                Action::Read,
            )],
        })
    }

    #[test]
    fn resource_round_trips_through_str() {
        for r in [
            Resource::Correspondence,
            Resource::FileUnit,
            Resource::Loan,
            Resource::User,
            Resource::Audit,
        ] {
            assert_eq!(r.as_str().parse::<Resource>().ok(), Some(r));
        }
        assert!("expediente".parse::<Resource>().is_err());
    }

    #[test]
    fn file_unit_serializes_kebab_case() {
        let json = serde_json::to_string(&Resource::FileUnit).unwrap();
        assert_eq!(json, "\"file-unit\"");
    }

    #[test]
    fn user_patch_merges_shallowly() {
        let mut user = User {
            id: "u-1".into(),
            username: "mesa.entrada".into(),
            email: "mesa@correspondencia.gov".into(),
            first_name: "María".into(),
            last_name: "González".into(),
            role: sample_role(),
            area: "Mesa de Entrada".into(),
            is_active: true,
        };
        user.apply(UserPatch {
            area: Some("Archivo Central".into()),
            ..Default::default()
        });
        assert_eq!(user.area, "Archivo Central");
        assert_eq!(user.username, "mesa.entrada");
        assert_eq!(user.email, "mesa@correspondencia.gov");
    }

    #[test]
    fn initials_are_upper_cased() {
        let user = User {
            id: "u-1".into(),
            username: "maria".into(),
            email: "m@example.com".into(),
            first_name: "maría".into(),
            last_name: "gonzález".into(),
            role: sample_role(),
            area: "Mesa de Entrada".into(),
            is_active: true,
        };
        assert_eq!(user.initials(), "MG");
        assert_eq!(user.full_name(), "maría gonzález");
    }
}
