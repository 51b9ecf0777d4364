// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const SIGNUP_SUCCEEDED: &str = "auth.signup.succeeded";
pub const SIGNUP_REJECTED: &str = "auth.signup.rejected";
pub const SIGNIN_SUCCEEDED: &str = "auth.signin.succeeded";
pub const SIGNIN_REJECTED: &str = "auth.signin.rejected";
