// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::PasswordHasher;

/// Prefix for environment overrides, e.g. `AUTHCORE_TOKEN__SECRET`
pub const ENV_PREFIX: &str = "AUTHCORE_";

/// Minimum accepted length of the token signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (one year), in seconds
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log level
    pub log_level: String,
    /// Data directory path (flat-file user store)
    pub data_dir: PathBuf,
    /// Password hashing parameters
    pub hashing: HashingSettings,
    /// Token signing parameters
    pub token: TokenSettings,
    /// Login behaviour
    pub login: LoginSettings,
}

/// Password hashing algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Scrypt,
    Argon2id,
}

/// Cost parameters for the password hashers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingSettings {
    pub algorithm: HashAlgorithm,
    pub scrypt_log_n: u8,
    pub scrypt_r: u32,
    pub scrypt_p: u32,
    /// Argon2 memory cost in KiB
    pub argon2_m_cost: u32,
    pub argon2_t_cost: u32,
    pub argon2_p_cost: u32,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// HMAC secret for HS256 tokens
    pub secret: Option<String>,
    /// Token lifetime in seconds
    pub ttl_secs: u64,
    /// Optional `iss` claim, also enforced on decode
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginSettings {
    /// Run a throwaway hash when the login email is unknown so that
    /// "no such user" and "wrong password" take comparable time.
    pub equalize_timing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: PathBuf::from("data"),
            hashing: HashingSettings::default(),
            token: TokenSettings::default(),
            login: LoginSettings::default(),
        }
    }
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Scrypt,
            scrypt_log_n: 15,
            scrypt_r: 8,
            scrypt_p: 1,
            argon2_m_cost: 19 * 1024,
            argon2_t_cost: 2,
            argon2_p_cost: 1,
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_secs: 60 * 60, // 1 hour
            issuer: None,
        }
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("ttl_secs", &self.ttl_secs)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl Settings {
    /// Load settings from `authcore.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("authcore.toml")
    }

    /// Load settings from a specific file (TOML, or JSON by extension),
    /// with environment variables taking precedence.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(path.as_ref()).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Layered configuration sources: defaults, then file, then environment
    pub fn figment(path: &Path) -> Figment {
        let figment = Figment::from(Serialized::defaults(Settings::default()));
        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Toml::file(path)),
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check settings for values the core cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }

        if self.token.ttl_secs == 0 || self.token.ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "token.ttl_secs must be in 1..={MAX_TOKEN_TTL_SECS}"
            )));
        }

        if let Some(secret) = &self.token.secret {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::Invalid(format!(
                    "token.secret must be at least {MIN_SECRET_LEN} bytes"
                )));
            }
        }

        PasswordHasher::new(&self.hashing)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }

    /// Path of the flat-file user store
    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join(crate::storage::USERS_FILE)
    }
}
