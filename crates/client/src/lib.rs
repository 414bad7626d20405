//! Client code for hoard.
//!
//! This crate provides the origin fetcher and the request plumbing shared
//! with the proxy server: target URL parsing and header conversion.

pub mod fetch;

pub use fetch::{FetchConfig, OriginClient, UrlError, parse_target};
