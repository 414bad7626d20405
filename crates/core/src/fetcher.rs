//! The origin-fetch seam.
//!
//! Anything that turns a request into a response implements [`Fetcher`].
//! Caching is layered on top with [`FetcherExt::with_cache`], which returns
//! another `Fetcher`, so wrapped values compose like the originals.

use crate::Error;
use crate::cache::{CacheAside, CacheStore};
use crate::envelope::{RequestDescriptor, ResponseDescriptor};
use async_trait::async_trait;
use std::sync::Arc;

/// Fetch a response for a request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `req`.
    ///
    /// Non-200 responses are returned as values; `Err` is reserved for
    /// transport and storage failures.
    async fn fetch(&self, req: &RequestDescriptor) -> Result<ResponseDescriptor, Error>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, req: &RequestDescriptor) -> Result<ResponseDescriptor, Error> {
        (**self).fetch(req).await
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    async fn fetch(&self, req: &RequestDescriptor) -> Result<ResponseDescriptor, Error> {
        (**self).fetch(req).await
    }
}

/// Combinators available on every fetcher.
pub trait FetcherExt: Fetcher + Sized {
    /// Serve from `store` when possible and populate it after a miss.
    fn with_cache(self, store: CacheStore) -> CacheAside<Self> {
        CacheAside::new(self, store)
    }
}

impl<F: Fetcher + Sized> FetcherExt for F {}
