//! HTTP origin fetch over reqwest.
//!
//! ### Request
//! - Method, headers and body are replayed from the request descriptor.
//! - A default User-Agent is sent only when the descriptor carries none.
//!
//! ### Response capture
//! - Status and headers are always captured.
//! - The body is read only for `200 OK`; other statuses are returned with an
//!   empty body so error payloads are never buffered.
//!
//! No timeout, retry or backoff is applied; reqwest defaults are inherited.

pub mod headers;
pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use std::time::Instant;

pub use self::headers::{HOP_BY_HOP, is_hop_by_hop, to_fields, to_header_map};
pub use self::url::{UrlError, parse_target};

use hoard_core::{Error, Fetcher, RequestDescriptor, ResponseDescriptor};

/// Configuration for the origin client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string used when the request has none (default: "hoard/0.1")
    pub user_agent: String,

    /// Maximum number of redirects to follow (default: 10)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "hoard/0.1".to_string(), max_redirects: 10 }
    }
}

/// Fetches request descriptors from their origin.
#[derive(Debug, Clone)]
pub struct OriginClient {
    http: Client,
}

impl OriginClient {
    /// Create a new origin client with the given configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Origin(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Fetcher for OriginClient {
    async fn fetch(&self, req: &RequestDescriptor) -> Result<ResponseDescriptor, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(req.method().as_bytes())
            .map_err(|e| Error::Origin(format!("invalid method {:?}: {}", req.method(), e)))?;

        let mut request = self
            .http
            .request(method, req.url().clone())
            .headers(to_header_map(req.headers()));
        if !req.body().is_empty() {
            request = request.body(req.body().to_string());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Origin(format!("network error: {}", e)))?;

        let status = response.status();
        let headers = to_fields(response.headers());

        let body = if status == StatusCode::OK {
            response
                .text()
                .await
                .map_err(|e| Error::Origin(format!("failed to read response: {}", e)))?
        } else {
            String::new()
        };

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            req.method(),
            req.url(),
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(ResponseDescriptor::new(status.as_u16(), headers, body))
    }
}
