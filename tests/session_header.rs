mod common;

use common::MockBackend;
use social::api::{ApiClient, PostQuery};
use social::SessionHandle;

#[tokio::test]
async fn test_bearer_header_follows_session() {
    let backend = MockBackend::start().await;
    backend.seed_user("Ada", "ada@example.com", "secret");
    let app = backend.app();

    app.client().list_posts(&PostQuery::default()).await.unwrap();

    let session = app.auth().login("ada@example.com", "secret").await.unwrap();
    app.client().list_posts(&PostQuery::default()).await.unwrap();

    app.auth().logout();
    app.client().list_posts(&PostQuery::default()).await.unwrap();

    let seen: Vec<_> = backend
        .seen()
        .into_iter()
        .filter(|s| s.path == "/posts")
        .map(|s| s.authorization)
        .collect();
    assert_eq!(
        seen,
        vec![None, Some(format!("Bearer {}", session.jwt)), None]
    );
}

#[tokio::test]
async fn test_new_login_replaces_token() {
    let backend = MockBackend::start().await;
    backend.seed_user("Ada", "ada@example.com", "a");
    backend.seed_user("Bob", "bob@example.com", "b");
    let app = backend.app();
    let auth = app.auth();

    auth.login("ada@example.com", "a").await.unwrap();
    let bob = auth.login("bob@example.com", "b").await.unwrap();

    backend.clear_seen();
    let me = app.client().current_user().await.unwrap();
    assert_eq!(me.name, "Bob");

    let seen = backend.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization, Some(format!("Bearer {}", bob.jwt)));
    assert_eq!(app.client().interceptors().len(), 1);
}

#[tokio::test]
async fn test_failed_login_keeps_anonymous() {
    let backend = MockBackend::start().await;
    backend.seed_user("Ada", "ada@example.com", "secret");
    let app = backend.app();
    let auth = app.auth();

    let err = auth.login("ada@example.com", "wrong").await.unwrap_err();
    assert!(err.to_string().contains("bad credentials"));
    assert!(auth.last_error().is_some());
    assert!(!app.session().is_authenticated());
    assert!(app.client().interceptors().is_empty());
}

#[tokio::test]
async fn test_sessions_on_separate_clients_are_independent() {
    let backend = MockBackend::start().await;
    backend.seed_user("Ada", "ada@example.com", "secret");

    let first = SessionHandle::new(ApiClient::new(backend.client_config()).unwrap());
    let second = SessionHandle::new(ApiClient::new(backend.client_config()).unwrap());

    let auth = first
        .client()
        .login(&social::api::AuthnRequest {
            email: "ada@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    first.sign_in(auth);

    assert!(first.client().current_user().await.is_ok());
    let err = second.client().current_user().await.unwrap_err();
    assert!(err.is_unauthorized());
}
