// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! This module defines the `AuthService` trait, the entry point for
//! registration and login.
use async_trait::async_trait;
use authcore_common::{AccessToken, SanitizedIdentity, SignInCredentials, SignUpCredentials};

use crate::error::AuthError;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new identity. Fails with `DuplicateIdentity` when the name
    /// or the email is already taken.
    async fn sign_up(&self, credentials: SignUpCredentials) -> Result<SanitizedIdentity, AuthError>;

    /// Check login credentials and issue a signed access token. Fails with
    /// `InvalidCredentials` for an unknown email or a wrong password alike.
    async fn sign_in(&self, credentials: SignInCredentials) -> Result<AccessToken, AuthError>;
}
