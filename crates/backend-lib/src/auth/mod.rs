// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod token;
mod service;
mod service_impl;

pub use password::PasswordHasher;
pub use token::{JwtClaims, JwtSigner, TokenSigner};
pub use service::AuthService;
pub use service_impl::CredentialManager;
