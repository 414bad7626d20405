//! Filesystem-backed cache-aside layer.
//!
//! This module provides persistent, fingerprint-keyed storage of origin
//! responses. It supports:
//!
//! - Header-independent request fingerprints using SHA-256
//! - One pretty-printed JSON record per entry, grouped by host
//! - Degrade-to-miss on missing or malformed records
//! - A cache-aside fetcher with optional per-fingerprint single-flight

pub mod aside;
pub mod flight;
pub mod hash;
pub mod record;
pub mod store;

pub use crate::Error;

pub use aside::CacheAside;
pub use hash::fingerprint;
pub use record::CacheEntry;
pub use store::{CacheStore, Lookup};
