use authcore_common::{SignInCredentials, SignUpCredentials};
use authcore_lib::{error::AuthError, storage::USERS_FILE, AppState};
use tempfile::TempDir;

use crate::test_utils::test_settings;

fn state_in(temp_dir: &TempDir) -> AppState {
    let mut settings = test_settings();
    settings.data_dir = temp_dir.path().to_path_buf();
    AppState::with_flat_file_store(settings).unwrap()
}

#[tokio::test]
async fn test_identity_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    let user = {
        let state = state_in(&temp_dir);
        state
            .auth
            .sign_up(SignUpCredentials::new("alice", "a@x.com", "p1"))
            .await
            .unwrap()
    };

    let state = state_in(&temp_dir);
    let token = state
        .auth
        .sign_in(SignInCredentials::new("a@x.com", "p1"))
        .await
        .unwrap();
    let claims = state.signer.verify(&token.access_token).unwrap();
    assert_eq!(claims.sub, user.id.to_string());

    let dup = state
        .auth
        .sign_up(SignUpCredentials::new("bob", "a@x.com", "p2"))
        .await;
    assert!(matches!(dup, Err(AuthError::DuplicateIdentity)));
}

#[tokio::test]
async fn test_plaintext_password_never_reaches_disk() {
    let temp_dir = TempDir::new().unwrap();
    let state = state_in(&temp_dir);

    state
        .auth
        .sign_up(SignUpCredentials::new("alice", "a@x.com", "plaintext-secret"))
        .await
        .unwrap();

    let contents = std::fs::read_to_string(temp_dir.path().join(USERS_FILE)).unwrap();
    assert!(!contents.contains("plaintext-secret"));
    assert!(contents.contains("password_hash"));
}

#[test]
fn test_app_state_requires_token_secret() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = test_settings();
    settings.data_dir = temp_dir.path().to_path_buf();
    settings.token.secret = None;

    let result = AppState::with_flat_file_store(settings);
    assert!(matches!(result, Err(AuthError::Signer(_))));
}
