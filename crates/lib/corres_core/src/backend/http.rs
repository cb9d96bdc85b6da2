//! HTTP implementation of the auth-service boundary.
//!
//! Thin `reqwest` client for the real API: JSON bodies, a 10 second request
//! timeout, and a bearer header wherever a token is available. A 401 maps to
//! a credential failure; transport errors surface as boundary failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use super::AuthBackend;
use crate::auth::AuthError;
use crate::models::auth::{AuthResponse, LoginCredentials, User};

/// Request timeout applied to every call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

/// Error body shape returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

/// [`AuthBackend`] over the real auth API.
pub struct HttpAuthBackend {
    client: Client,
    base_url: Url,
}

impl HttpAuthBackend {
    /// Build a client for an API root such as `http://localhost:3001/api`.
    pub fn new(base_url: &str) -> Result<Self, AuthError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AuthError::ValidationError(format!("invalid base URL: {e}")))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AuthError::BoundaryError(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(path)
            .map_err(|e| AuthError::BoundaryError(format!("bad endpoint {path}: {e}")))
    }

    fn bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and decode the JSON body, translating HTTP failures
    /// into the auth error taxonomy.
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, AuthError> {
        let response = request
            .send()
            .await
            .map_err(|e| AuthError::BoundaryError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| AuthError::BoundaryError(format!("malformed response: {e}")));
        }

        let message = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| status.to_string());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::CredentialError),
            StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => {
                Err(AuthError::ValidationError(message))
            }
            _ => Err(AuthError::BoundaryError(message)),
        }
    }

    /// As [`execute`](Self::execute), discarding the body.
    async fn execute_unit(&self, request: RequestBuilder) -> Result<(), AuthError> {
        let response = request
            .send()
            .await
            .map_err(|e| AuthError::BoundaryError(e.to_string()))?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::CredentialError),
            status => Err(AuthError::BoundaryError(status.to_string())),
        }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, AuthError> {
        let url = self.endpoint("auth/login")?;
        self.execute(self.client.post(url).json(credentials)).await
    }

    async fn logout(&self, token: Option<&str>) -> Result<(), AuthError> {
        let url = self.endpoint("auth/logout")?;
        self.execute_unit(Self::bearer(self.client.post(url), token))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let url = self.endpoint("auth/refresh")?;
        self.execute(self.client.post(url).json(&RefreshRequest { refresh_token }))
            .await
    }

    async fn current_user(&self, token: &str) -> Result<User, AuthError> {
        let url = self.endpoint("auth/me")?;
        self.execute(self.client.get(url).bearer_auth(token)).await
    }

    async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let url = self.endpoint("auth/change-password")?;
        self.execute_unit(
            self.client
                .post(url)
                .bearer_auth(token)
                .json(&ChangePasswordRequest {
                    current_password,
                    new_password,
                }),
        )
        .await
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let url = self.endpoint("auth/forgot-password")?;
        self.execute_unit(self.client.post(url).json(&ForgotPasswordRequest { email }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_urls() {
        assert!(HttpAuthBackend::new("not a url").is_err());
        assert!(HttpAuthBackend::new("http://localhost:3001/api/").is_ok());
    }

    #[test]
    fn endpoints_join_against_the_base() {
        let backend = HttpAuthBackend::new("http://localhost:3001/api/").unwrap();
        let url = backend.endpoint("auth/login").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/auth/login");
    }
}
