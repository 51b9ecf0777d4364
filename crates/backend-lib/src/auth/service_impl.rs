// =============
// crates/backend-lib/src/auth/service_impl.rs
// =============
//! Credential manager: signup with salted hashing, login with token issue.
use std::sync::Arc;

use async_trait::async_trait;
use authcore_common::{
    AccessToken, ClaimsPayload, Identity, NewIdentity, SanitizedIdentity, SignInCredentials,
    SignUpCredentials,
};
use metrics::counter;
use tracing::{info, instrument, warn};
use zeroize::Zeroizing;

use crate::auth::{AuthService, PasswordHasher, TokenSigner};
use crate::config::Settings;
use crate::error::{AuthError, HashError};
use crate::metrics::{SIGNIN_REJECTED, SIGNIN_SUCCEEDED, SIGNUP_REJECTED, SIGNUP_SUCCEEDED};
use crate::storage::UserStore;

/// Default [`AuthService`] implementation.
///
/// Holds no per-request state; one instance can serve any number of
/// concurrent calls.
pub struct CredentialManager {
    store: Arc<dyn UserStore>,
    signer: Arc<dyn TokenSigner>,
    hasher: PasswordHasher,
    equalize_timing: bool,
    dummy_salt: String,
}

impl CredentialManager {
    pub fn new(
        store: Arc<dyn UserStore>,
        signer: Arc<dyn TokenSigner>,
        hasher: PasswordHasher,
    ) -> Self {
        let dummy_salt = hasher.generate_salt();
        Self {
            store,
            signer,
            hasher,
            equalize_timing: false,
            dummy_salt,
        }
    }

    /// Build from settings: hashing parameters and the login timing option
    pub fn from_settings(
        store: Arc<dyn UserStore>,
        signer: Arc<dyn TokenSigner>,
        settings: &Settings,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(&settings.hashing)?;
        Ok(Self::new(store, signer, hasher).with_equalized_timing(settings.login.equalize_timing))
    }

    /// Hash a throwaway password when the login email is unknown
    pub fn with_equalized_timing(mut self, enabled: bool) -> Self {
        self.equalize_timing = enabled;
        self
    }

    async fn hash_blocking(
        &self,
        password: Zeroizing<String>,
        salt: String,
    ) -> Result<String, HashError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(password.as_bytes(), &salt)).await?
    }

    async fn verify_blocking(
        &self,
        password: Zeroizing<String>,
        salt: String,
        password_hash: String,
    ) -> Result<bool, HashError> {
        let hasher = self.hasher.clone();
        let verified = tokio::task::spawn_blocking(move || {
            hasher.verify(password.as_bytes(), &salt, &password_hash)
        })
        .await?;
        Ok(verified)
    }

    fn reject_login(&self) -> AuthError {
        warn!("login rejected");
        counter!(SIGNIN_REJECTED).increment(1);
        AuthError::InvalidCredentials
    }
}

#[async_trait]
impl AuthService for CredentialManager {
    #[instrument(skip_all, fields(name = %credentials.name))]
    async fn sign_up(&self, credentials: SignUpCredentials) -> Result<SanitizedIdentity, AuthError> {
        let SignUpCredentials {
            name,
            email,
            password,
        } = credentials;
        let password = Zeroizing::new(password);

        if self.store.find_by_name_or_email(&name, &email).await?.is_some() {
            warn!("signup rejected: name or email already in use");
            counter!(SIGNUP_REJECTED).increment(1);
            return Err(AuthError::DuplicateIdentity);
        }

        let salt = self.hasher.generate_salt();
        let password_hash = self.hash_blocking(password, salt.clone()).await?;

        let identity = self
            .store
            .create(NewIdentity {
                name,
                email,
                password_hash,
                salt,
            })
            .await?;

        info!(user_id = %identity.id, "user registered");
        counter!(SIGNUP_SUCCEEDED).increment(1);
        Ok(SanitizedIdentity::from(identity))
    }

    #[instrument(skip_all)]
    async fn sign_in(&self, credentials: SignInCredentials) -> Result<AccessToken, AuthError> {
        let SignInCredentials { email, password } = credentials;
        let password = Zeroizing::new(password);

        let Some(identity) = self.store.find_by_email_for_login(&email).await? else {
            if self.equalize_timing {
                // Output discarded, only the elapsed time matters.
                let _ = self.hash_blocking(password, self.dummy_salt.clone()).await;
            }
            return Err(self.reject_login());
        };

        let claims = ClaimsPayload::from(&identity);
        let Identity {
            salt,
            password_hash,
            ..
        } = identity;

        if !self.verify_blocking(password, salt, password_hash).await? {
            return Err(self.reject_login());
        }

        let access_token = self.signer.sign(&claims).await?;

        info!(user_id = %claims.subject, "access token issued");
        counter!(SIGNIN_SUCCEEDED).increment(1);
        Ok(AccessToken { access_token })
    }
}
