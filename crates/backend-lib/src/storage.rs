// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! User store abstraction with in-memory and flat-file implementations.
//!
//! Stores enforce no invariants of their own. Uniqueness and secret
//! handling are the credential manager's job.
use std::{fs, path::{Path, PathBuf}, sync::Arc};

use async_trait::async_trait;
use authcore_common::{Identity, NewIdentity, SanitizedIdentity, UserId};
use chrono::Utc;
use dashmap::DashMap;
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};

use crate::error::StoreError;

/// File name of the flat-file user store inside the data directory
pub const USERS_FILE: &str = "users.json";

/// Trait for user storage backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Any identity whose name equals `name` or whose email equals `email`.
    /// Secret fields are not returned.
    async fn find_by_name_or_email(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<SanitizedIdentity>, StoreError>;

    /// The identity registered under `email`, with hash and salt populated
    async fn find_by_email_for_login(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    /// Persist a new identity. The store assigns the id and creation time.
    async fn create(&self, new_identity: NewIdentity) -> Result<Identity, StoreError>;
}

fn into_identity(new_identity: NewIdentity) -> Identity {
    Identity {
        id: UserId::new(),
        name: new_identity.name,
        email: new_identity.email,
        password_hash: new_identity.password_hash,
        salt: new_identity.salt,
        created_at: Utc::now(),
    }
}

/// Process-local user store
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<DashMap<UserId, Identity>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_name_or_email(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<SanitizedIdentity>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|user| user.name == name || user.email == email)
            .map(|user| SanitizedIdentity::from(user.value())))
    }

    async fn find_by_email_for_login(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|user| user.email == email)
            .map(|user| user.value().clone()))
    }

    async fn create(&self, new_identity: NewIdentity) -> Result<Identity, StoreError> {
        let identity = into_identity(new_identity);
        self.users.insert(identity.id, identity.clone());
        Ok(identity)
    }
}

/// Flat-file implementation of the UserStore trait.
///
/// All identities live in one JSON array that is rewritten through a
/// temporary file and renamed into place on every create.
pub struct FlatFileUserStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FlatFileUserStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            path: root.join(USERS_FILE),
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the backing JSON file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Identity>, StoreError> {
        if !tokio_fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }

        let content = tokio_fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn persist(&self, users: &[Identity]) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(users)?;

        let mut file = tokio_fs::File::create(&tmp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        tokio_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for FlatFileUserStore {
    async fn find_by_name_or_email(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<SanitizedIdentity>, StoreError> {
        let users = self.load().await?;
        Ok(users
            .iter()
            .find(|user| user.name == name || user.email == email)
            .map(SanitizedIdentity::from))
    }

    async fn find_by_email_for_login(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let users = self.load().await?;
        Ok(users.into_iter().find(|user| user.email == email))
    }

    async fn create(&self, new_identity: NewIdentity) -> Result<Identity, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.load().await?;
        let identity = into_identity(new_identity);
        users.push(identity.clone());
        self.persist(&users).await?;

        Ok(identity)
    }
}
