//! Account endpoint: `user` for the token's own account, `users/{login}`
//! for a named one.

use docmirror_core::ports::{IRemoteSource, RemoteError};
use docmirror_remote::YuqueClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_fetch_own_account() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_data(
        &server,
        "/user",
        json!({"id": 1, "login": "alice", "name": "Alice", "updated_at": "2024-01-01T00:00:00.000Z"}),
    )
    .await;

    let account = source.fetch_account(None).await.expect("fetch_account failed");

    assert_eq!(account.get_str("login"), Some("alice"));
    assert_eq!(account.get_str("name"), Some("Alice"));
    assert_eq!(account.get("id"), Some(&json!(1)));
}

#[tokio::test]
async fn test_fetch_named_account() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_data(&server, "/users/bob", json!({"login": "bob"})).await;

    let account = source.fetch_account(Some("bob")).await.unwrap();
    assert_eq!(account.get_str("login"), Some("bob"));
}

#[tokio::test]
async fn test_empty_user_means_own_account() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_data(&server, "/user", json!({"login": "alice"})).await;

    let account = source.fetch_account(Some("")).await.unwrap();
    assert_eq!(account.get_str("login"), Some("alice"));
}

#[tokio::test]
async fn test_unauthorized_keeps_status_and_body() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_raw(&server, "/user", 401, r#"{"message":"Unauthorized"}"#).await;

    let err = source.fetch_account(None).await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::RequestFailed {
            status: 401,
            body: r#"{"message":"Unauthorized"}"#.to_string(),
        }
    );
}

#[tokio::test]
async fn test_production_constructor_uses_api_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"login": "alice"}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = YuqueClient::new(&server.uri(), Some("t".to_string())).unwrap();
    let source = docmirror_remote::YuqueRemoteSource::new(client);

    let account = source.fetch_account(None).await.unwrap();
    assert_eq!(account.get_str("login"), Some("alice"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = YuqueClient::with_base_url(&uri, None).unwrap();
    let source = docmirror_remote::YuqueRemoteSource::new(client);

    let err = source.fetch_account(None).await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)), "got {err:?}");
}
