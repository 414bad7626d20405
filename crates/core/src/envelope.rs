//! Request and response envelopes.
//!
//! These are the serializable snapshots persisted in cache records. Both are
//! immutable once built; fields are only reachable through accessors.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Header mapping with unique keys and values as received.
pub type Headers = BTreeMap<String, String>;

/// A request to be fulfilled by an origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    url: Url,
    method: String,
    headers: Headers,
    body: String,
}

impl RequestDescriptor {
    /// Build a descriptor for `url`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the URL has no host, or a host of `.`
    /// or `..`. The host names the directory its cache entries live in and
    /// must stay a single segment under the cache root.
    pub fn new(url: Url, method: impl Into<String>, headers: Headers, body: impl Into<String>) -> Result<Self, Error> {
        match url.host_str() {
            None | Some("") => return Err(Error::InvalidUrl(format!("{url} has no host"))),
            Some(host @ ("." | "..")) => return Err(Error::InvalidUrl(format!("host {host:?} is not allowed"))),
            Some(_) => {}
        }

        Ok(Self { url, method: method.into(), headers, body: body.into() })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host of the target URL, always present for a constructed descriptor.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// An origin response as captured for forwarding and caching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    status: u16,
    headers: Headers,
    #[serde(rename = "data")]
    body: String,
}

impl ResponseDescriptor {
    pub fn new(status: u16, headers: Headers, body: impl Into<String>) -> Self {
        Self { status, headers, body: body.into() }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Only exact 200 responses are cacheable.
    pub fn is_successful(&self) -> bool {
        self.status == 200
    }
}
