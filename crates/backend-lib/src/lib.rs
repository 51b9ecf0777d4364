// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Credential core: registration with salted password hashing, login
//! validation and signed access token issue.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;

use std::sync::Arc;

use crate::auth::{AuthService, CredentialManager, JwtSigner};
use crate::config::Settings;
use crate::error::AuthError;
use crate::storage::{FlatFileUserStore, UserStore};

/// Wired-up services shared by every caller
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Token signer, kept for token introspection
    pub signer: Arc<JwtSigner>,
    /// Settings the services were built from
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state over the given user store
    pub fn new(store: Arc<dyn UserStore>, settings: Settings) -> Result<Self, AuthError> {
        let signer = Arc::new(JwtSigner::from_settings(&settings.token)?);
        let auth = Arc::new(CredentialManager::from_settings(
            store,
            signer.clone(),
            &settings,
        )?);

        Ok(Self {
            auth,
            signer,
            settings: Arc::new(settings),
        })
    }

    /// Create a new application state backed by the flat-file user store
    /// in `settings.data_dir`
    pub fn with_flat_file_store(settings: Settings) -> Result<Self, AuthError> {
        let store = Arc::new(FlatFileUserStore::new(&settings.data_dir)?);
        Self::new(store, settings)
    }
}
