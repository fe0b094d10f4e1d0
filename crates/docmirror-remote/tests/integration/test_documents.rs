//! Document list and document detail endpoints.

use docmirror_core::ports::{IRemoteSource, RemoteError};
use serde_json::json;

use crate::common;

#[tokio::test]
async fn test_fetch_documents() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_data(
        &server,
        "/repos/alice/notes/docs",
        json!([
            {"slug": "intro", "title": "Intro", "updated_at": "2024-01-01T00:00:00.000Z"},
            {"slug": "setup", "title": "Setup", "updated_at": "2024-01-03T00:00:00.000Z"}
        ]),
    )
    .await;

    let docs = source
        .fetch_documents(&common::namespace("alice", "notes"))
        .await
        .expect("fetch_documents failed");

    assert_eq!(docs.len(), 2);
    let intro = docs.find("slug", "intro").unwrap();
    assert_eq!(intro.get_str("title"), Some("Intro"));
}

#[tokio::test]
async fn test_fetch_document_detail_returns_whole_record() {
    let (server, source) = common::setup_yuque_mock().await;
    let body = json!({
        "slug": "intro",
        "title": "Intro",
        "format": "lake",
        "body": "# Intro",
        "body_html": "<h1>Intro</h1>",
        "updated_at": "2024-01-01T00:00:00.000Z"
    });
    common::mount_data(&server, "/repos/alice/notes/docs/intro", body.clone()).await;

    let detail = source
        .fetch_document_detail(&common::namespace("alice", "notes"), &common::slug("intro"))
        .await
        .unwrap();

    assert_eq!(detail.into_value(), body);
}

#[tokio::test]
async fn test_document_slug_is_percent_encoded() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_data(
        &server,
        "/repos/alice/notes/docs/hello%20world",
        json!({"slug": "hello world"}),
    )
    .await;

    let detail = source
        .fetch_document_detail(
            &common::namespace("alice", "notes"),
            &common::slug("hello world"),
        )
        .await
        .unwrap();
    assert_eq!(detail.get_str("slug"), Some("hello world"));
}

#[tokio::test]
async fn test_missing_document_is_request_failed() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_raw(
        &server,
        "/repos/alice/notes/docs/gone",
        404,
        r#"{"status":404,"message":"Not Found"}"#,
    )
    .await;

    let err = source
        .fetch_document_detail(&common::namespace("alice", "notes"), &common::slug("gone"))
        .await
        .unwrap_err();

    match err {
        RemoteError::RequestFailed { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Not Found"));
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_request_failed() {
    let (server, source) = common::setup_yuque_mock().await;
    common::mount_raw(&server, "/repos/alice/notes/docs", 500, "oops").await;

    let err = source
        .fetch_documents(&common::namespace("alice", "notes"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RemoteError::RequestFailed {
            status: 500,
            body: "oops".to_string(),
        }
    );
}
