//! Permission evaluation.
//!
//! Pure queries over a user's role. A grant matches only its exact
//! `(resource, action)` pair; the composite checks are folds over the
//! single-pair check.

use crate::models::auth::{Action, Module, Resource, User};

/// Whether the user's role holds an exact `(resource, action)` grant.
///
/// A missing user yields `false`, never an error.
pub fn has_permission(user: Option<&User>, resource: Resource, action: Action) -> bool {
    match user {
        Some(user) => user.role.grants(resource, action),
        None => false,
    }
}

/// Logical OR over a list of permission pairs.
pub fn has_any_permission(user: Option<&User>, pairs: &[(Resource, Action)]) -> bool {
    pairs
        .iter()
        .any(|&(resource, action)| has_permission(user, resource, action))
}

/// Logical AND over a list of permission pairs.
///
/// Vacuously `true` for an empty list, even when logged out.
pub fn has_all_permissions(user: Option<&User>, pairs: &[(Resource, Action)]) -> bool {
    pairs
        .iter()
        .all(|&(resource, action)| has_permission(user, resource, action))
}

/// Whether the user may enter a console module.
pub fn can_access_module(user: Option<&User>, module: Module) -> bool {
    let (resource, action) = module.required_permission();
    has_permission(user, resource, action)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::auth::{Permission, Role};

    fn reader() -> User {
        User {
            id: "consultor-001".into(),
            username: "consultor".into(),
            email: "consultor@correspondencia.gov".into(),
            first_name: "Elena".into(),
            last_name: "Suárez".into(),
            role: Arc::new(Role {
                id: "consultor".into(),
                name: "Consultor".into(),
                permissions: vec![Permission::new(
                    "1",
                    "Ver correspondencia",
                    Resource::Correspondence,
                    Action::Read,
                )],
            }),
            area: "Consultoría".into(),
            is_active: true,
        }
    }

    #[test]
    fn exact_pair_matches() {
        let user = reader();
        assert!(has_permission(
            Some(&user),
            Resource::Correspondence,
            Action::Read
        ));
    }

    #[test]
    fn action_mismatch_is_denied() {
        let user = reader();
        assert!(!has_permission(
            Some(&user),
            Resource::Correspondence,
            Action::Create
        ));
    }

    #[test]
    fn resource_mismatch_is_denied() {
        let user = reader();
        assert!(!has_permission(
            Some(&user),
            Resource::FileUnit,
            Action::Read
        ));
    }

    #[test]
    fn missing_user_is_denied() {
        assert!(!has_permission(None, Resource::Correspondence, Action::Read));
        assert!(!can_access_module(None, Module::Correspondence));
    }

    #[test]
    fn any_is_an_or_fold() {
        let user = reader();
        let pairs = [
            (Resource::Loan, Action::Authorize),
            (Resource::Correspondence, Action::Read),
        ];
        assert!(has_any_permission(Some(&user), &pairs));
        assert!(!has_any_permission(
            Some(&user),
            &[(Resource::Loan, Action::Authorize)]
        ));
        assert!(!has_any_permission(Some(&user), &[]));
    }

    #[test]
    fn all_is_an_and_fold() {
        let user = reader();
        assert!(has_all_permissions(
            Some(&user),
            &[(Resource::Correspondence, Action::Read)]
        ));
        assert!(!has_all_permissions(
            Some(&user),
            &[
                (Resource::Correspondence, Action::Read),
                (Resource::Correspondence, Action::Update),
            ]
        ));
        assert!(has_all_permissions(Some(&user), &[]));
    }

    #[test]
    fn module_gating_maps_to_single_permissions() {
        let user = reader();
        assert!(can_access_module(Some(&user), Module::Correspondence));
        assert!(!can_access_module(Some(&user), Module::Archive));
        assert!(!can_access_module(Some(&user), Module::Loans));
        assert!(!can_access_module(Some(&user), Module::Admin));
    }
}
