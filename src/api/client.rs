//! Social REST API Client
//!
//! HTTP client for the social backend. Entity-specific calls live next to
//! their DTOs (`users.rs`, `posts.rs`, ...) as further `impl ApiClient`
//! blocks; this file owns transport, URL building and response decoding.

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::error::{ApiError, ApiResult};
use super::interceptor::Interceptors;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin, e.g. "http://localhost:5000"
    pub base_url: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 30,
            user_agent: format!("social/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Typed client for the social backend
///
/// Cheap to clone; clones share the connection pool and interceptor chain.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    interceptors: Interceptors,
}

impl ApiClient {
    /// Create a new client; fails if the base URL cannot be parsed
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent)
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            http,
            base_url,
            interceptors: Interceptors::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The interceptor chain applied to every request
    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// Build a request to `path` (relative to the base URL) with the
    /// interceptor chain already applied
    pub(crate) fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(method = %method, path = %url.path(), "API request");

        Ok(self.interceptors.apply(self.http.request(method, url)))
    }

    /// Issue a request built by `build` and decode a JSON payload
    pub(crate) async fn fetch_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> ApiResult<T> {
        let response = self.send(method, path, build).await?;
        let text = response.text().await.map_err(ApiError::from_transport)?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Issue a request whose success body is ignored (204 endpoints)
    pub(crate) async fn fetch_empty(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> ApiResult<()> {
        self.send(method, path, build).await?;
        Ok(())
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.fetch_json(Method::GET, path, |r| r).await
    }

    pub(crate) async fn get_json_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<T> {
        self.fetch_json(Method::GET, path, |r| r.query(query)).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.fetch_json(method, path, |r| r.json(body)).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> ApiResult<Response> {
        let request = build(self.request(method.clone(), path)?);
        let response = request.send().await.map_err(ApiError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        tracing::debug!(method = %method, path, status = status.as_u16(), "API call rejected");
        Err(ApiError::from_status(status, text))
    }
}

/// Encode one path segment (entity ids are opaque strings)
pub(crate) fn segment(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}

fn parse_base_url(raw: &str) -> ApiResult<Url> {
    let mut url = Url::parse(raw).map_err(|e| ApiError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }

    // Url::join replaces the last segment unless the path ends with '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::interceptor::BearerAuth;
    use std::sync::Arc;

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.user_agent.starts_with("social/"));
    }

    #[test]
    fn test_request_url_joins_base_path() {
        let client = client("http://api.example.com/v1");
        let request = client.request(Method::GET, "/posts").unwrap().build().unwrap();
        assert_eq!(request.url().as_str(), "http://api.example.com/v1/posts");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = ApiClient::new(ClientConfig {
            base_url: "not a url".to_string(),
            ..ClientConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl { .. }));

        let err = ApiClient::new(ClientConfig {
            base_url: "mailto:someone@example.com".to_string(),
            ..ClientConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_clones_share_interceptors() {
        let client = client("http://localhost:5000");
        let clone = client.clone();
        client
            .interceptors()
            .install(Arc::new(BearerAuth::new("token")));

        let request = clone.request(Method::GET, "/users").unwrap().build().unwrap();
        assert_eq!(
            request.headers().get("Authorization").unwrap(),
            "Bearer token"
        );
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
        assert_eq!(segment("65f0ab"), "65f0ab");
    }
}
