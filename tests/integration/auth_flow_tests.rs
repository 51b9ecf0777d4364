use std::sync::Arc;
use std::time::{Duration, Instant};

use authcore_common::{SignInCredentials, SignUpCredentials};
use authcore_lib::{
    auth::{AuthService, CredentialManager, PasswordHasher},
    config::HashAlgorithm,
    error::{AuthError, StoreError},
    storage::InMemoryUserStore,
    AppState,
};

use crate::test_utils::{
    build_manager, cheap_hashing, test_settings, test_signer, FailOn, FailingUserStore,
    RecordingSigner, RecordingUserStore,
};

fn alice() -> SignUpCredentials {
    SignUpCredentials::new("alice", "a@x.com", "p1")
}

#[tokio::test]
async fn test_sign_up_returns_sanitized_identity() {
    let store = Arc::new(RecordingUserStore::new());
    let manager = build_manager(store.clone(), test_signer());

    let user = manager.sign_up(alice()).await.unwrap();

    let json = serde_json::to_value(&user).unwrap();
    let obj = json.as_object().unwrap();
    assert_eq!(obj["name"], "alice");
    assert_eq!(obj["email"], "a@x.com");
    for secret_key in ["password", "passwordHash", "password_hash", "salt"] {
        assert!(!obj.contains_key(secret_key), "leaked {secret_key}");
    }

    // The uniqueness check ran before the single create
    assert_eq!(store.uniqueness_checks(), 1);
    assert_eq!(store.creates(), 1);

    let stored = store.stored("a@x.com").await.unwrap();
    assert_eq!(stored.id, user.id);
    assert_ne!(stored.password_hash, "p1");
}

#[tokio::test]
async fn test_email_collision_is_rejected_without_create() {
    let store = Arc::new(RecordingUserStore::new());
    let manager = build_manager(store.clone(), test_signer());

    manager.sign_up(alice()).await.unwrap();
    let err = manager
        .sign_up(SignUpCredentials::new("alice2", "a@x.com", "p2"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::DuplicateIdentity));
    assert!(err.is_client_error());
    assert_eq!(store.creates(), 1);
}

#[tokio::test]
async fn test_name_collision_is_rejected_without_create() {
    let store = Arc::new(RecordingUserStore::new());
    let manager = build_manager(store.clone(), test_signer());

    manager.sign_up(alice()).await.unwrap();
    let err = manager
        .sign_up(SignUpCredentials::new("alice", "other@x.com", "p2"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::DuplicateIdentity));
    assert_eq!(store.creates(), 1);
}

#[tokio::test]
async fn test_repeated_sign_up_is_not_idempotent() {
    let manager = build_manager(Arc::new(InMemoryUserStore::new()), test_signer());

    manager.sign_up(alice()).await.unwrap();
    let second = manager.sign_up(alice()).await;
    assert!(matches!(second, Err(AuthError::DuplicateIdentity)));
}

#[tokio::test]
async fn test_sign_in_round_trip() {
    let signer = Arc::new(RecordingSigner::new());
    let manager = build_manager(Arc::new(InMemoryUserStore::new()), signer.clone());

    let user = manager.sign_up(alice()).await.unwrap();

    let token = manager
        .sign_in(SignInCredentials::new("a@x.com", "p1"))
        .await
        .unwrap();
    assert!(!token.access_token.is_empty());
    assert_eq!(signer.signed(), 1);

    let claims = signer.jwt().verify(&token.access_token).unwrap();
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.user_name, user.name);

    let err = manager
        .sign_in(SignInCredentials::new("a@x.com", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    // No token minted for the failed attempt
    assert_eq!(signer.signed(), 1);
}

#[tokio::test]
async fn test_sign_in_errors_do_not_reveal_account_existence() {
    let store = Arc::new(RecordingUserStore::new());
    let manager = build_manager(store.clone(), test_signer());
    manager.sign_up(alice()).await.unwrap();

    let unknown = manager
        .sign_in(SignInCredentials::new("nobody@x.com", "p1"))
        .await
        .unwrap_err();
    let wrong = manager
        .sign_in(SignInCredentials::new("a@x.com", "p2"))
        .await
        .unwrap_err();

    assert_eq!(unknown.to_string(), wrong.to_string());
    assert_eq!(unknown.error_code(), wrong.error_code());
    assert_eq!(unknown.sanitized_message(), wrong.sanitized_message());
    assert_eq!(store.login_lookups(), 2);
    // Login never performs the name-or-email uniqueness lookup
    assert_eq!(store.uniqueness_checks(), 1);
}

#[tokio::test]
async fn test_sign_in_uses_email_only() {
    let manager = build_manager(Arc::new(InMemoryUserStore::new()), test_signer());
    manager.sign_up(alice()).await.unwrap();

    // The user name is not a login identifier
    let err = manager
        .sign_in(SignInCredentials::new("alice", "p1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_store_failure_on_lookup_propagates() {
    let store = Arc::new(FailingUserStore::new(FailOn::Lookup));
    let signer = Arc::new(RecordingSigner::new());
    let manager = build_manager(store, signer.clone());

    let err = manager.sign_up(alice()).await.unwrap_err();
    assert!(matches!(err, AuthError::Store(StoreError::Unavailable(ref msg)) if msg == FailingUserStore::MESSAGE));
    assert!(!err.is_client_error());

    let err = manager
        .sign_in(SignInCredentials::new("a@x.com", "p1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Store(_)));
    assert_eq!(signer.signed(), 0);
}

#[tokio::test]
async fn test_store_failure_on_create_propagates() {
    let manager = build_manager(Arc::new(FailingUserStore::new(FailOn::Create)), test_signer());

    let err = manager.sign_up(alice()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        StoreError::Unavailable(FailingUserStore::MESSAGE.to_string()).to_string()
    );
}

#[tokio::test]
async fn test_argon2_configured_flow() {
    let mut hashing = cheap_hashing();
    hashing.algorithm = HashAlgorithm::Argon2id;
    let store = Arc::new(RecordingUserStore::new());
    let manager = CredentialManager::new(
        store.clone(),
        test_signer(),
        PasswordHasher::new(&hashing).unwrap(),
    );

    manager.sign_up(alice()).await.unwrap();
    let stored = store.stored("a@x.com").await.unwrap();
    assert!(stored.password_hash.starts_with("$argon2id$"));

    assert!(manager
        .sign_in(SignInCredentials::new("a@x.com", "p1"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_concurrent_sign_ups_share_one_manager() {
    let store = Arc::new(RecordingUserStore::new());
    let manager = Arc::new(build_manager(store.clone(), test_signer()));

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let manager = manager.clone();
        tasks.spawn(async move {
            manager
                .sign_up(SignUpCredentials::new(
                    format!("user{i}"),
                    format!("user{i}@x.com"),
                    format!("pw{i}"),
                ))
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }
    assert_eq!(store.creates(), 8);

    for i in 0..8 {
        let token = manager
            .sign_in(SignInCredentials::new(format!("user{i}@x.com"), format!("pw{i}")))
            .await;
        assert!(token.is_ok());
    }
}

async fn fastest_rejection(state: &AppState, email: &str) -> Duration {
    let mut fastest = Duration::MAX;
    for _ in 0..3 {
        let started = Instant::now();
        let err = state
            .auth
            .sign_in(SignInCredentials::new(email, "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        fastest = fastest.min(started.elapsed());
    }
    fastest
}

#[tokio::test]
async fn test_equalize_timing_setting_hashes_on_unknown_email() {
    let mut settings = test_settings();
    settings.hashing.scrypt_log_n = 11;
    settings.login.equalize_timing = true;
    let state = AppState::new(Arc::new(InMemoryUserStore::new()), settings).unwrap();
    state.auth.sign_up(alice()).await.unwrap();

    let wrong_password = fastest_rejection(&state, "a@x.com").await;
    let unknown_email = fastest_rejection(&state, "nobody@x.com").await;
    assert!(
        unknown_email * 4 >= wrong_password,
        "unknown email took {unknown_email:?}, wrong password took {wrong_password:?}"
    );
}
