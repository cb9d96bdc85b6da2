//! Credential validation rules.
//!
//! Front-ends run these before contacting the session manager; the manager
//! itself forwards whatever it is given to the auth service.

use super::AuthError;
use crate::models::auth::LoginCredentials;

/// Username length bounds.
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;

/// Password length bounds.
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 100;

/// Letters, digits, dots, hyphens, and underscores.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Minimal shape check: something@something.something, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let part_ok = |s: &str| !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '@');
    part_ok(local) && part_ok(host) && part_ok(tld)
}

/// Validate a login form before it is submitted.
pub fn validate_credentials(credentials: &LoginCredentials) -> Result<(), AuthError> {
    let username = credentials.username.trim();
    if username.is_empty() {
        return Err(AuthError::ValidationError("El usuario es requerido".into()));
    }
    if username.chars().count() < USERNAME_MIN {
        return Err(AuthError::ValidationError(format!(
            "El usuario debe tener al menos {USERNAME_MIN} caracteres"
        )));
    }
    if username.chars().count() > USERNAME_MAX {
        return Err(AuthError::ValidationError(format!(
            "El usuario no puede exceder {USERNAME_MAX} caracteres"
        )));
    }
    if !is_valid_username(username) {
        return Err(AuthError::ValidationError(
            "El usuario solo puede contener letras, números, puntos, guiones y guiones bajos"
                .into(),
        ));
    }

    if credentials.password.is_empty() {
        return Err(AuthError::ValidationError(
            "La contraseña es requerida".into(),
        ));
    }
    if credentials.password.chars().count() < PASSWORD_MIN {
        return Err(AuthError::ValidationError(format!(
            "La contraseña debe tener al menos {PASSWORD_MIN} caracteres"
        )));
    }
    if credentials.password.chars().count() > PASSWORD_MAX {
        return Err(AuthError::ValidationError(format!(
            "La contraseña no puede exceder {PASSWORD_MAX} caracteres"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(username: &str, password: &str) -> LoginCredentials {
        LoginCredentials {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn accepts_the_dev_credentials() {
        assert!(validate_credentials(&creds("admin", "admin123")).is_ok());
        assert!(validate_credentials(&creds("mesa.entrada", "mesa123")).is_ok());
        assert!(validate_credentials(&creds("resp.juridica", "juridica123")).is_ok());
    }

    #[test]
    fn rejects_short_and_empty_fields() {
        assert!(validate_credentials(&creds("", "admin123")).is_err());
        assert!(validate_credentials(&creds("ab", "admin123")).is_err());
        assert!(validate_credentials(&creds("admin", "")).is_err());
        assert!(validate_credentials(&creds("admin", "12345")).is_err());
    }

    #[test]
    fn rejects_usernames_outside_the_charset() {
        assert!(validate_credentials(&creds("mesa entrada", "mesa123")).is_err());
        assert!(validate_credentials(&creds("mesa@entrada", "mesa123")).is_err());
        assert!(is_valid_username("resp.juridica"));
        assert!(is_valid_username("user_name-01"));
        assert!(!is_valid_username("ñandú"));
    }

    #[test]
    fn rejects_overlong_fields() {
        assert!(validate_credentials(&creds(&"a".repeat(51), "admin123")).is_err());
        assert!(validate_credentials(&creds("admin", &"a".repeat(101))).is_err());
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("admin@correspondencia.gov"));
        assert!(is_valid_email("a.b@c.d.e"));
        assert!(!is_valid_email("admin"));
        assert!(!is_valid_email("admin@"));
        assert!(!is_valid_email("@correspondencia.gov"));
        assert!(!is_valid_email("ad min@correspondencia.gov"));
        assert!(!is_valid_email("admin@gov"));
    }
}
