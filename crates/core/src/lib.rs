//! Core types and shared functionality for hoard.
//!
//! This crate provides:
//! - Request/response envelopes and request fingerprinting
//! - Filesystem cache store and the cache-aside fetcher
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fetcher;

pub use cache::{CacheAside, CacheStore, Lookup};
pub use config::AppConfig;
pub use envelope::{Headers, RequestDescriptor, ResponseDescriptor};
pub use error::Error;
pub use fetcher::{Fetcher, FetcherExt};
