//! Authentication of the operator performing an administrative action.
//!
//! Accounts carry bcrypt hashes only; plaintext passwords never leave the
//! caller that prompted for them.

use std::collections::HashMap;

use thiserror::Error;

use crate::{Principal, PrincipalId, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("no administrative account is configured")]
    NotConfigured,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Username/password pair supplied by the operator.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Pluggable authentication boundary.
pub trait Authenticator: Send + Sync {
    /// Resolve credentials to a principal, or reject them.
    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError>;
}

/// Rejects every attempt. Used when no account has been configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllAuthenticator;

impl Authenticator for DenyAllAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        tracing::warn!(username = %credentials.username, "authentication refused: no account configured");
        Err(AuthError::NotConfigured)
    }
}

#[derive(Debug, Clone)]
struct Account {
    password_hash: String,
    roles: Vec<Role>,
}

/// bcrypt-backed account table.
#[derive(Debug, Clone, Default)]
pub struct PasswordAuthenticator {
    accounts: HashMap<String, Account>,
}

impl PasswordAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(
        mut self,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        roles: Vec<Role>,
    ) -> Self {
        self.accounts.insert(
            username.into(),
            Account {
                password_hash: password_hash.into(),
                roles,
            },
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Authenticator for PasswordAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        if self.accounts.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        let Some(account) = self.accounts.get(&credentials.username) else {
            tracing::warn!(username = %credentials.username, "authentication failed: unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        let valid = bcrypt::verify(&credentials.password, &account.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !valid {
            tracing::warn!(username = %credentials.username, "authentication failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Principal::new(
            PrincipalId::new(credentials.username.clone()),
            account.roles.clone(),
        ))
    }
}

/// bcrypt work factor used for hashes this crate produces.
pub const DEFAULT_HASH_COST: u32 = bcrypt::DEFAULT_COST;

/// Produce a bcrypt hash suitable for configuring an account.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}
