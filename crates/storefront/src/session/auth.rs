//! Logged-in user state.

use secrecy::{ExposeSecret, SecretString};
use techmart_core::UserId;

use crate::models::User;

/// A bearer token together with the profile it belongs to.
///
/// `Debug` output redacts the token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    token: SecretString,
    user: User,
}

impl AuthSession {
    #[must_use]
    pub const fn new(token: SecretString, user: User) -> Self {
        Self { token, user }
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user.id
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    /// Same user holding the same token.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.user.id == other.user.id
            && self.token.expose_secret() == other.token.expose_secret()
    }
}
