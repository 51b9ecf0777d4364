// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Salted password hashing and verification.
//!
//! Hashes are PHC strings (`$scrypt$ln=..` or `$argon2id$v=19$..`). The salt
//! is stored next to the hash as its own field and must match the salt
//! embedded in the PHC string for a verification to succeed.
use argon2::{Algorithm, Argon2, Version};
use password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher as PhcHasher, PasswordVerifier, SaltString,
};
use scrypt::Scrypt;

use crate::config::{HashAlgorithm, HashingSettings};
use crate::error::HashError;

/// Largest accepted scrypt cost exponent (N = 2^20 needs 1 GiB at r = 8)
pub const MAX_SCRYPT_LOG_N: u8 = 20;

#[derive(Clone)]
enum HasherKind {
    Scrypt(scrypt::Params),
    Argon2(argon2::Params),
}

/// Slow salted password hasher configured from [`HashingSettings`].
#[derive(Clone)]
pub struct PasswordHasher {
    kind: HasherKind,
}

impl PasswordHasher {
    /// Build a hasher, rejecting cost parameters the algorithms refuse
    pub fn new(settings: &HashingSettings) -> Result<Self, HashError> {
        let kind = match settings.algorithm {
            HashAlgorithm::Scrypt => {
                if settings.scrypt_log_n == 0 || settings.scrypt_log_n > MAX_SCRYPT_LOG_N {
                    return Err(HashError::InvalidParams(format!(
                        "scrypt_log_n must be in 1..={MAX_SCRYPT_LOG_N}"
                    )));
                }
                if settings.scrypt_r == 0 || settings.scrypt_p == 0 {
                    return Err(HashError::InvalidParams(
                        "scrypt_r and scrypt_p must be positive".into(),
                    ));
                }
                let params = scrypt::Params::new(
                    settings.scrypt_log_n,
                    settings.scrypt_r,
                    settings.scrypt_p,
                    scrypt::Params::RECOMMENDED_LEN,
                )
                .map_err(|e| HashError::InvalidParams(format!("scrypt: {e}")))?;
                HasherKind::Scrypt(params)
            },
            HashAlgorithm::Argon2id => {
                let params = argon2::Params::new(
                    settings.argon2_m_cost,
                    settings.argon2_t_cost,
                    settings.argon2_p_cost,
                    None,
                )
                .map_err(|e| HashError::InvalidParams(format!("argon2: {e}")))?;
                HasherKind::Argon2(params)
            },
        };
        Ok(Self { kind })
    }

    /// The algorithm new hashes are produced with
    pub fn algorithm(&self) -> HashAlgorithm {
        match self.kind {
            HasherKind::Scrypt(_) => HashAlgorithm::Scrypt,
            HasherKind::Argon2(_) => HashAlgorithm::Argon2id,
        }
    }

    /// Generate a fresh random salt from the OS CSPRNG, B64-encoded
    pub fn generate_salt(&self) -> String {
        SaltString::generate(&mut OsRng).as_str().to_owned()
    }

    /// Hash `password` with `salt`. Same inputs always give the same output.
    pub fn hash(&self, password: &[u8], salt: &str) -> Result<String, HashError> {
        let salt = SaltString::from_b64(salt)?;
        let hash = match &self.kind {
            HasherKind::Scrypt(params) => Scrypt
                .hash_password_customized(password, None, None, *params, &salt)?
                .to_string(),
            HasherKind::Argon2(params) => {
                Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
                    .hash_password(password, &salt)?
                    .to_string()
            },
        };
        Ok(hash)
    }

    /// Recompute the hash of `password` under the stored salt and parameters
    /// and compare it with `stored_hash`.
    ///
    /// The output comparison is constant-time. A malformed stored hash or a
    /// salt that does not match the one inside the hash verifies as `false`.
    pub fn verify(&self, password: &[u8], salt: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        if parsed.salt.map(|s| s.as_str()) != Some(salt) {
            return false;
        }

        // Algorithm and cost come from the stored hash, not from `self`.
        let argon2 = Argon2::default();
        let verifiers: [&dyn PasswordVerifier; 2] = [&Scrypt, &argon2];
        parsed.verify_password(&verifiers, password).is_ok()
    }
}
