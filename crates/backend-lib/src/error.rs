// crates/backend-lib/src/error.rs

//! Central error types for the credential core and its collaborators.
use thiserror::Error;

/// Errors surfaced by the credential manager.
///
/// Collaborator failures are carried through unchanged; the core never
/// retries or reinterprets them.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username/E-mail already in use.")]
    DuplicateIdentity,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Hashing(#[from] HashError),
}

impl AuthError {
    /// Whether the caller can correct this error by changing its input
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthError::DuplicateIdentity | AuthError::InvalidCredentials)
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::DuplicateIdentity => "AUTH_DUPLICATE",
            AuthError::InvalidCredentials => "AUTH_INVALID",
            AuthError::Store(_) => "STORE_001",
            AuthError::Signer(_) => "TOKEN_001",
            AuthError::Hashing(_) => "HASH_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AuthError::DuplicateIdentity | AuthError::InvalidCredentials => self.to_string(),
            AuthError::Store(_) | AuthError::Signer(_) | AuthError::Hashing(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }
}

/// Errors raised by user store backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("User store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while signing or decoding tokens
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Token signing secret must be at least {min} bytes, got {actual}")]
    WeakSecret { min: usize, actual: usize },

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Errors raised by the password hasher
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Password hashing failed: {0}")]
    Hash(password_hash::Error),

    #[error("Hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<password_hash::Error> for HashError {
    fn from(err: password_hash::Error) -> Self {
        HashError::Hash(err)
    }
}
