//! User service client: login, registration and the current profile.

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::{ServiceClient, authorized};
use crate::error::ApiError;
use crate::models::user::TokenResponse;
use crate::models::{Credentials, Registration, User};
use crate::session::AuthSession;

#[derive(Clone)]
pub struct UsersClient {
    api: ServiceClient,
}

impl UsersClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            api: ServiceClient::new(http, base_url, "users"),
        }
    }

    /// `POST /auth/login` followed by `GET /auth/me` with the new token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 401 for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: SecretString) -> Result<AuthSession, ApiError> {
        let credentials = Credentials {
            email: email.to_owned(),
            password,
        };
        let TokenResponse { access_token } = self
            .api
            .json(self.api.post("auth/login").json(&credentials))
            .await?;
        let token = SecretString::from(access_token);
        let user = self.me(&token).await?;
        tracing::info!(user_id = %user.id, "Logged in");
        Ok(AuthSession::new(token, user))
    }

    /// `POST /auth/register`. The new account still has to log in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a blank password, otherwise the
    /// service's answer (400 when the email is already registered).
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        if registration.password.expose_secret().trim().is_empty() {
            return Err(ApiError::InvalidInput("password is required".to_owned()));
        }
        self.api
            .json(self.api.post("auth/register").json(registration))
            .await
    }

    /// `GET /auth/me`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 401 for an expired token.
    #[instrument(skip_all)]
    pub async fn me(&self, token: &SecretString) -> Result<User, ApiError> {
        self.api.json(authorized(self.api.get("auth/me"), token)).await
    }
}
