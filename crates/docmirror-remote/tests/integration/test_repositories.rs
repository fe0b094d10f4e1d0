//! Repository list and repository detail endpoints.

use docmirror_core::ports::{IRemoteSource, RemoteError};
use serde_json::json;

use crate::common;

#[tokio::test]
async fn test_fetch_repositories_preserves_remote_order() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_data(
        &server,
        "/users/alice/repos",
        json!([
            {"slug": "zeta", "name": "Zeta", "updated_at": "2024-01-02T00:00:00.000Z"},
            {"slug": "alpha", "name": "Alpha", "updated_at": "2024-01-01T00:00:00.000Z"}
        ]),
    )
    .await;

    let repos = source
        .fetch_repositories(&common::slug("alice"))
        .await
        .expect("fetch_repositories failed");

    let ids: Vec<&str> = repos.ids("slug").collect();
    assert_eq!(ids, vec!["zeta", "alpha"]);
}

#[tokio::test]
async fn test_fetch_repositories_empty_list() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_data(&server, "/users/alice/repos", json!([])).await;

    let repos = source.fetch_repositories(&common::slug("alice")).await.unwrap();
    assert!(repos.is_empty());
}

#[tokio::test]
async fn test_fetch_repository_detail_carries_toc() {
    let (server, source) = common::setup_yuque_mock().await;
    let toc = "- type: DOC\n  title: Intro\n  url: intro\n";
    common::mount_data(
        &server,
        "/repos/alice/notes",
        json!({"slug": "notes", "namespace": "alice/notes", "toc_yml": toc}),
    )
    .await;

    let detail = source
        .fetch_repository_detail(&common::namespace("alice", "notes"))
        .await
        .unwrap();

    assert_eq!(detail.get_str("toc_yml"), Some(toc));
    assert_eq!(detail.get_str("namespace"), Some("alice/notes"));
}

#[tokio::test]
async fn test_list_endpoint_returning_object_is_malformed() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_data(&server, "/users/alice/repos", json!({"slug": "notes"})).await;

    let err = source
        .fetch_repositories(&common::slug("alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::MalformedPayload(_)), "got {err:?}");
}

#[tokio::test]
async fn test_missing_data_field_is_malformed() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_raw(&server, "/repos/alice/notes", 200, r#"{"meta": {}}"#).await;

    let err = source
        .fetch_repository_detail(&common::namespace("alice", "notes"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::MalformedPayload(_)), "got {err:?}");
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_raw(&server, "/users/alice/repos", 200, "<html>maintenance</html>").await;

    let err = source
        .fetch_repositories(&common::slug("alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::MalformedPayload(_)), "got {err:?}");
}
