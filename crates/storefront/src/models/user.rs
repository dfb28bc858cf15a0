//! User account shapes consumed from the user service.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use techmart_core::{AccountStatus, Email, UserId, UserRole};

/// A user profile as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub status: Option<AccountStatus>,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default)]
    pub blocked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blocked_reason: Option<String>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Blocked or suspended accounts cannot shop.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        matches!(
            self.status,
            Some(AccountStatus::Blocked | AccountStatus::Suspended)
        )
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub mobile: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

/// Response of `POST /auth/login`. No `Debug`: it holds the raw token.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
