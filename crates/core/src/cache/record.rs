//! On-disk cache record format.
//!
//! A record is a pretty-printed JSON object:
//!
//! ```text
//! { "date": <epoch-millis>, "req": { url, method, headers, body }, "res": { status, headers, data } }
//! ```
//!
//! The `req` snapshot is written for traceability only. Decoding reads `date`
//! and `res` and ignores everything else.

use crate::Error;
use crate::envelope::{RequestDescriptor, ResponseDescriptor};
use serde::{Deserialize, Serialize};

/// A persisted cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Creation time in milliseconds since the Unix epoch.
    pub date: i64,
    pub req: RequestDescriptor,
    pub res: ResponseDescriptor,
}

#[derive(Deserialize)]
struct StoredResponse {
    #[allow(dead_code)]
    date: i64,
    res: ResponseDescriptor,
}

impl CacheEntry {
    /// Snapshot a request/response pair stamped with the current time.
    pub fn now(req: &RequestDescriptor, res: &ResponseDescriptor) -> Self {
        Self { date: chrono::Utc::now().timestamp_millis(), req: req.clone(), res: res.clone() }
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Decode the response stored in a record.
///
/// # Errors
///
/// Returns `Error::MalformedRecord` if the bytes are not a record or hold a
/// response that could never have been cached.
pub fn decode_response(bytes: &[u8]) -> Result<ResponseDescriptor, Error> {
    let stored: StoredResponse = serde_json::from_slice(bytes).map_err(|e| Error::MalformedRecord(e.to_string()))?;

    if !stored.res.is_successful() {
        return Err(Error::MalformedRecord(format!("stored status {} is not cacheable", stored.res.status())));
    }

    Ok(stored.res)
}
