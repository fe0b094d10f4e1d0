//! Shared test helpers for REST API integration tests
//!
//! Provides wiremock-based mock server setup. Each helper mounts the
//! necessary endpoints and returns a configured source pointing at the
//! mock server.

use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docmirror_core::domain::{Namespace, Slug};
use docmirror_remote::{YuqueClient, YuqueRemoteSource};

pub const TEST_TOKEN: &str = "test-access-token";
pub const TEST_USER_AGENT: &str = "docmirror-test";

/// Starts a mock server and returns a source whose base URL is the server root.
///
/// Mocks are therefore mounted without the `/api/v2` prefix.
pub async fn setup_yuque_mock() -> (MockServer, YuqueRemoteSource) {
    let server = MockServer::start().await;
    let client = YuqueClient::with_base_url(&server.uri(), Some(TEST_TOKEN.to_string()))
        .expect("client")
        .with_user_agent(TEST_USER_AGENT);
    (server, YuqueRemoteSource::new(client))
}

/// Mounts a GET endpoint answering `{"data": data}`, requiring both headers.
pub async fn mount_data(server: &MockServer, endpoint: &str, data: Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .and(header("X-Auth-Token", TEST_TOKEN))
        .and(header("User-Agent", TEST_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": data })))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts a GET endpoint answering with a raw status and body.
pub async fn mount_raw(server: &MockServer, endpoint: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

pub fn slug(s: &str) -> Slug {
    Slug::new(s).unwrap()
}

pub fn namespace(owner: &str, repo: &str) -> Namespace {
    Namespace::new(slug(owner), slug(repo))
}
