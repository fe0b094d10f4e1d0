//! Yuque-style REST API client
//!
//! Provides a small HTTP client for the `/api/v2` endpoints. Handles the
//! authentication headers, URL construction and the `{"data": ...}` response
//! envelope shared by every endpoint.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docmirror_remote::client::YuqueClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = YuqueClient::new("https://www.yuque.com", Some("token".to_string()))?;
//! let user = client.get_record(&["user"]).await?;
//! println!("Hello, {}", user.label());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use docmirror_core::config::RemoteConfig;
use docmirror_core::domain::{Record, Snapshot};
use docmirror_core::ports::RemoteError;
use reqwest::header::USER_AGENT;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// API prefix appended to the configured host
const API_PREFIX: &str = "api/v2";

/// Header carrying the API token
const AUTH_HEADER: &str = "X-Auth-Token";

/// Default `User-Agent` header value
pub const DEFAULT_USER_AGENT: &str = "docmirror";

/// Upper bound for a single request, connect to last byte
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Every response body is wrapped as `{"data": ...}`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Value,
}

/// HTTP client for the origin API
///
/// Wraps `reqwest::Client` with the token header, the user agent and base
/// URL construction. Path segments are percent-encoded individually, so a
/// slug can never escape its position in the URL.
#[derive(Debug, Clone)]
pub struct YuqueClient {
    /// The underlying HTTP client (follows redirects)
    client: Client,
    /// Base URL, `{host}/api/v2` in production
    base_url: Url,
    /// API token, sent as `X-Auth-Token` when present
    token: Option<String>,
    /// `User-Agent` header value
    user_agent: String,
}

impl YuqueClient {
    /// Creates a client for `host` (scheme and host, without `/api/v2`)
    pub fn new(host: &str, token: Option<String>) -> Result<Self, RemoteError> {
        let base = format!("{}/{}", host.trim_end_matches('/'), API_PREFIX);
        Self::with_base_url(&base, token)
    }

    /// Creates a client with a custom base URL (useful for testing)
    ///
    /// The base URL is used as-is; no `/api/v2` suffix is added.
    pub fn with_base_url(base_url: &str, token: Option<String>) -> Result<Self, RemoteError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| RemoteError::Transport(format!("invalid base URL {base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(RemoteError::Transport(format!(
                "invalid base URL {base_url}: not a hierarchical URL"
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parsed,
            token,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Creates a client from the `remote` configuration section
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        Ok(Self::new(&config.host, config.token.clone())?.with_user_agent(&config.user_agent))
    }

    /// Overrides the `User-Agent` header value
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns true if requests carry an API token
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Builds the URL of an endpoint from its path segments
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Cannot fail: non-hierarchical base URLs are rejected at construction.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Creates an authenticated GET request builder for the given endpoint
    pub fn request(&self, segments: &[&str]) -> RequestBuilder {
        let builder = self
            .client
            .get(self.url(segments))
            .header(USER_AGENT, &self.user_agent);
        match &self.token {
            Some(token) => builder.header(AUTH_HEADER, token),
            None => builder,
        }
    }

    /// Performs a GET and returns the unwrapped `data` value
    ///
    /// # Errors
    /// - [`RemoteError::Transport`] if the request could not be completed
    /// - [`RemoteError::RequestFailed`] on a non-2xx status (body kept verbatim)
    /// - [`RemoteError::MalformedPayload`] if the body is not a JSON envelope
    ///   with a non-null `data` field
    pub async fn get_data(&self, segments: &[&str]) -> Result<Value, RemoteError> {
        let endpoint = segments.join("/");
        debug!(endpoint = %endpoint, "GET");

        let response = self
            .request(segments)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !status.is_success() {
            debug!(endpoint = %endpoint, status = status.as_u16(), "request failed");
            return Err(RemoteError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|e| RemoteError::MalformedPayload(format!("{endpoint}: {e}")))?;

        match envelope.data {
            Value::Null => Err(RemoteError::MalformedPayload(format!(
                "{endpoint}: response has no \"data\" field"
            ))),
            data => {
                debug!(endpoint = %endpoint, bytes = body.len(), "request succeeded");
                Ok(data)
            }
        }
    }

    /// Performs a GET whose `data` is a single object
    pub async fn get_record(&self, segments: &[&str]) -> Result<Record, RemoteError> {
        let data = self.get_data(segments).await?;
        Record::from_value(data)
            .map_err(|e| RemoteError::MalformedPayload(format!("{}: {e}", segments.join("/"))))
    }

    /// Performs a GET whose `data` is an array of objects
    pub async fn get_snapshot(&self, segments: &[&str]) -> Result<Snapshot, RemoteError> {
        let data = self.get_data(segments).await?;
        Snapshot::from_value(data)
            .map_err(|e| RemoteError::MalformedPayload(format!("{}: {e}", segments.join("/"))))
    }
}
