//! Cache-aside wrapper around a fetcher.
//!
//! A hit returns the stored response with no freshness check. A miss calls
//! the wrapped fetcher, hands the result to the store (which drops anything
//! that is not a 200) and returns it unchanged.

use super::flight::InFlight;
use super::hash::fingerprint;
use super::store::CacheStore;
use crate::Error;
use crate::envelope::{RequestDescriptor, ResponseDescriptor};
use crate::fetcher::Fetcher;
use async_trait::async_trait;

/// A fetcher that consults a [`CacheStore`] before its inner fetcher.
pub struct CacheAside<F> {
    inner: F,
    store: CacheStore,
    flights: Option<InFlight>,
}

impl<F: Fetcher> CacheAside<F> {
    pub fn new(inner: F, store: CacheStore) -> Self {
        Self { inner, store, flights: None }
    }

    /// Let at most one miss per fingerprint reach the inner fetcher at a time.
    ///
    /// Later arrivals wait for the first to finish and then re-read the store,
    /// so a successful fetch is shared instead of repeated.
    pub fn single_flight(mut self) -> Self {
        self.flights = Some(InFlight::new());
        self
    }

    async fn fill(&self, req: &RequestDescriptor) -> Result<ResponseDescriptor, Error> {
        tracing::debug!(url = %req.url(), method = req.method(), "cache miss");
        let res = self.inner.fetch(req).await?;
        self.store.set(req, &res).await?;
        Ok(res)
    }

    async fn fill_once(&self, flights: &InFlight, req: &RequestDescriptor) -> Result<ResponseDescriptor, Error> {
        let _guard = flights.acquire(&fingerprint(req)).await;

        if let Some(res) = self.store.get(req).await? {
            tracing::debug!(url = %req.url(), "cache filled while waiting");
            return Ok(res);
        }
        self.fill(req).await
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for CacheAside<F> {
    async fn fetch(&self, req: &RequestDescriptor) -> Result<ResponseDescriptor, Error> {
        if let Some(res) = self.store.get(req).await? {
            tracing::debug!(url = %req.url(), method = req.method(), "cache hit");
            return Ok(res);
        }

        match &self.flights {
            Some(flights) => self.fill_once(flights, req).await,
            None => self.fill(req).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Headers;
    use crate::fetcher::FetcherExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use tempfile::tempdir;
    use url::Url;

    /// Origin stub that answers every request with a fixed status and body.
    struct StubOrigin {
        status: u16,
        body: &'static str,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StubOrigin {
        fn new(status: u16, body: &'static str) -> Self {
            Self { status, body, delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for StubOrigin {
        async fn fetch(&self, _req: &RequestDescriptor) -> Result<ResponseDescriptor, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let body = if self.status == 200 { self.body } else { "" };
            Ok(ResponseDescriptor::new(self.status, Headers::new(), body))
        }
    }

    struct FailingOrigin;

    #[async_trait]
    impl Fetcher for FailingOrigin {
        async fn fetch(&self, _req: &RequestDescriptor) -> Result<ResponseDescriptor, Error> {
            Err(Error::Origin("connection refused".into()))
        }
    }

    fn request(headers: &[(&str, &str)]) -> RequestDescriptor {
        let headers: Headers = headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        RequestDescriptor::new(Url::parse("http://example.com/a").unwrap(), "GET", headers, "").unwrap()
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let dir = tempdir().unwrap();
        let origin = Arc::new(StubOrigin::new(200, "hello"));
        let cached = origin.clone().with_cache(CacheStore::new(dir.path()));

        let first = cached.fetch(&request(&[("user-agent", "one")])).await.unwrap();
        assert_eq!(first.body(), "hello");
        assert_eq!(origin.calls(), 1);

        let second = cached
            .fetch(&request(&[("user-agent", "two"), ("accept", "*/*")]))
            .await
            .unwrap();
        assert_eq!(second.body(), "hello");
        assert_eq!(origin.calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let dir = tempdir().unwrap();
        let origin = Arc::new(StubOrigin::new(500, "boom"));
        let cached = origin.clone().with_cache(CacheStore::new(dir.path()));

        let res = cached.fetch(&request(&[])).await.unwrap();
        assert_eq!(res.status(), 500);
        assert_eq!(res.body(), "");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        cached.fetch(&request(&[])).await.unwrap();
        assert_eq!(origin.calls(), 2);
    }

    #[tokio::test]
    async fn test_origin_error_propagates() {
        let dir = tempdir().unwrap();
        let cached = FailingOrigin.with_cache(CacheStore::new(dir.path()));

        let result = cached.fetch(&request(&[])).await;
        assert!(matches!(result, Err(Error::Origin(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_refetched_and_overwritten() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let req = request(&[]);

        let path = store.path_for(&req);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"\x89PNG garbage").unwrap();

        let origin = Arc::new(StubOrigin::new(200, "fresh"));
        let cached = origin.clone().with_cache(store);

        assert_eq!(cached.fetch(&req).await.unwrap().body(), "fresh");
        assert_eq!(origin.calls(), 1);

        let record: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(record["res"]["data"], "fresh");
    }

    #[tokio::test]
    async fn test_wrappers_compose_over_boxed_fetchers() {
        let dir = tempdir().unwrap();
        let origin: Box<dyn Fetcher> = Box::new(StubOrigin::new(200, "boxed"));
        let cached: Arc<dyn Fetcher> = Arc::new(origin.with_cache(CacheStore::new(dir.path())));

        assert_eq!(cached.fetch(&request(&[])).await.unwrap().body(), "boxed");
    }

    #[tokio::test]
    async fn test_single_flight_collapses_concurrent_misses() {
        let dir = tempdir().unwrap();
        let origin = Arc::new(StubOrigin { delay: Duration::from_millis(50), ..StubOrigin::new(200, "once") });
        let cached = Arc::new(origin.clone().with_cache(CacheStore::new(dir.path())).single_flight());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cached = cached.clone();
                tokio::spawn(async move { cached.fetch(&request(&[])).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().body(), "once");
        }
        assert_eq!(origin.calls(), 1);
    }

    #[tokio::test]
    async fn test_single_flight_waiters_refetch_after_failed_leader() {
        let dir = tempdir().unwrap();
        let origin = Arc::new(StubOrigin { delay: Duration::from_millis(50), ..StubOrigin::new(500, "") });
        let cached = Arc::new(origin.clone().with_cache(CacheStore::new(dir.path())).single_flight());

        let started = Instant::now();
        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let cached = cached.clone();
                tokio::spawn(async move { cached.fetch(&request(&[])).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().status(), 500);
        }

        // Each waiter found nothing cached and went to the origin in turn.
        assert_eq!(origin.calls(), 3);
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(cached.flights.as_ref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_single_flight_fetch_releases_key() {
        let dir = tempdir().unwrap();
        let origin = Arc::new(StubOrigin { delay: Duration::from_millis(200), ..StubOrigin::new(200, "late") });
        let cached = origin.clone().with_cache(CacheStore::new(dir.path())).single_flight();

        let abandoned = tokio::time::timeout(Duration::from_millis(20), cached.fetch(&request(&[]))).await;
        assert!(abandoned.is_err());
        assert!(cached.flights.as_ref().unwrap().is_empty());

        let res = tokio::time::timeout(Duration::from_secs(2), cached.fetch(&request(&[])))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(res.body(), "late");
        assert_eq!(origin.calls(), 2);
    }

    #[tokio::test]
    async fn test_without_single_flight_concurrent_misses_race() {
        let dir = tempdir().unwrap();
        let origin = Arc::new(StubOrigin { delay: Duration::from_millis(50), ..StubOrigin::new(200, "race") });
        let cached = Arc::new(origin.clone().with_cache(CacheStore::new(dir.path())));

        let a = tokio::spawn({
            let cached = cached.clone();
            async move { cached.fetch(&request(&[])).await }
        });
        let b = tokio::spawn({
            let cached = cached.clone();
            async move { cached.fetch(&request(&[])).await }
        });

        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
        assert_eq!(origin.calls(), 2);
    }
}
