// ================
// crates/common/src/lib.rs
// ================
//! Common types shared between the credential core, its stores and its
//! callers. Secret-bearing types redact themselves in `Debug` output.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const REDACTED: &str = "[REDACTED]";

/// Opaque identifier of a registered user. Assigned by the user store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credentials submitted at registration.
///
/// Field presence is validated by the transport layer before these reach
/// the credential manager.
#[derive(Clone, Deserialize)]
pub struct SignUpCredentials {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignUpCredentials {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for SignUpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpCredentials")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Credentials submitted at login. Email is the login identifier.
#[derive(Clone, Deserialize)]
pub struct SignInCredentials {
    pub email: String,
    pub password: String,
}

impl SignInCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for SignInCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInCredentials")
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Stored identity record, including secret material.
///
/// Only user stores and the credential core handle this type; callers
/// outside the core receive a [`SanitizedIdentity`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &REDACTED)
            .field("salt", &REDACTED)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields handed to a user store when creating an identity.
#[derive(Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
}

impl fmt::Debug for NewIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewIdentity")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &REDACTED)
            .field("salt", &REDACTED)
            .finish()
    }
}

/// Identity view that is safe to hand to any caller.
///
/// Has no secret fields at all, so nothing can leak through it when the
/// stored record grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedIdentity {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for SanitizedIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            created_at: identity.created_at,
        }
    }
}

impl From<Identity> for SanitizedIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
            email: identity.email,
            created_at: identity.created_at,
        }
    }
}

/// Identity facts embedded in an issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsPayload {
    pub subject: UserId,
    pub user_name: String,
}

impl From<&Identity> for ClaimsPayload {
    fn from(identity: &Identity) -> Self {
        Self {
            subject: identity.id,
            user_name: identity.name.clone(),
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
}
