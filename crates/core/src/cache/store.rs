//! Filesystem-backed cache store.
//!
//! Entries live at `<root>/<host>/<fingerprint>.json`. The host directory is
//! only for organization; the fingerprint alone identifies an entry.

use super::hash::fingerprint;
use super::record::{CacheEntry, decode_response};
use crate::Error;
use crate::envelope::{RequestDescriptor, ResponseDescriptor};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

/// Outcome of reading the entry for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(ResponseDescriptor),
    NotFound,
    /// An entry exists but failed to decode.
    Malformed(String),
}

/// Persistent request/response cache.
///
/// Holds no locks; concurrent writers to one entry race and the last one wins.
#[derive(Clone, Debug)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the entry for `req`.
    pub fn path_for(&self, req: &RequestDescriptor) -> PathBuf {
        self.root
            .join(req.host())
            .join(format!("{}.json", fingerprint(req)))
    }

    /// Read the entry for `req`, distinguishing missing from malformed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` for any I/O failure other than not-found.
    pub async fn lookup(&self, req: &RequestDescriptor) -> Result<Lookup, Error> {
        let path = self.path_for(req);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Lookup::NotFound),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read cache entry");
                return Err(Error::Storage(e));
            }
        };

        match decode_response(&bytes) {
            Ok(res) => Ok(Lookup::Hit(res)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding malformed cache entry");
                Ok(Lookup::Malformed(e.to_string()))
            }
        }
    }

    /// Get the cached response for `req`.
    ///
    /// Missing and malformed entries are both reported as `None`.
    pub async fn get(&self, req: &RequestDescriptor) -> Result<Option<ResponseDescriptor>, Error> {
        match self.lookup(req).await? {
            Lookup::Hit(res) => Ok(Some(res)),
            Lookup::NotFound | Lookup::Malformed(_) => Ok(None),
        }
    }

    /// Store `res` as the entry for `req`, replacing any previous entry.
    ///
    /// Returns `false` without touching the filesystem when the response is
    /// not successful.
    pub async fn set(&self, req: &RequestDescriptor, res: &ResponseDescriptor) -> Result<bool, Error> {
        if !res.is_successful() {
            tracing::debug!(url = %req.url(), status = res.status(), "skipping cache write for unsuccessful response");
            return Ok(false);
        }

        let path = self.path_for(req);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let bytes = CacheEntry::now(req, res).encode()?;
        fs::write(&path, bytes).await.inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to write cache entry");
        })?;

        tracing::debug!(url = %req.url(), path = %path.display(), "stored cache entry");
        Ok(true)
    }
}
