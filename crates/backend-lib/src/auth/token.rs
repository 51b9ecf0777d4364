// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed, time-bound access tokens.
use std::time::Duration;

use async_trait::async_trait;
use authcore_common::ClaimsPayload;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{TokenSettings, MIN_SECRET_LEN};
use crate::error::SignerError;

/// Turns a claims payload into a signed token string.
///
/// Signing keys and expiry policy belong to the implementation.
#[async_trait]
pub trait TokenSigner: Send + Sync {
    async fn sign(&self, claims: &ClaimsPayload) -> Result<String, SignerError>;
}

/// Registered and private claims carried by a JWT access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the user id
    pub sub: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    /// Issued at (unix seconds)
    pub iat: u64,
    /// Expiry (unix seconds)
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HS256 JWT signer
#[derive(Clone)]
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    issuer: Option<String>,
}

impl JwtSigner {
    pub fn new(secret: &[u8], ttl: Duration, issuer: Option<String>) -> Result<Self, SignerError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SignerError::WeakSecret {
                min: MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            issuer,
        })
    }

    pub fn from_settings(settings: &TokenSettings) -> Result<Self, SignerError> {
        let secret = settings.secret.as_deref().ok_or(SignerError::MissingSecret)?;
        Self::new(
            secret.as_bytes(),
            Duration::from_secs(settings.ttl_secs),
            settings.issuer.clone(),
        )
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Decode and validate a token issued by this signer.
    ///
    /// Checks signature, expiry and, when configured, the issuer.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, SignerError> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        let data = decode::<JwtClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    fn claims_for(&self, payload: &ClaimsPayload) -> JwtClaims {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        JwtClaims {
            sub: payload.subject.to_string(),
            user_name: payload.user_name.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl.as_secs()),
            iss: self.issuer.clone(),
        }
    }

    fn encode_claims(&self, claims: &JwtClaims) -> Result<String, SignerError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }
}

#[async_trait]
impl TokenSigner for JwtSigner {
    async fn sign(&self, claims: &ClaimsPayload) -> Result<String, SignerError> {
        self.encode_claims(&self.claims_for(claims))
    }
}
