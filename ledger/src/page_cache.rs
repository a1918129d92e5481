use crate::domain;
use crate::ports::{KeyValueStore, PageFetcher};
use async_trait::async_trait;
use bytes::Bytes;
use shared::{Error, Result, TtlMs};
use std::sync::Arc;
use tracing::debug;

/// Default expiry window for cached pages.
pub const DEFAULT_PAGE_TTL: TtlMs = TtlMs(10_000);

fn cached_key(url: &str) -> String {
    format!("cached:{url}")
}

fn count_key(url: &str) -> String {
    format!("count:{url}")
}

/// URL-keyed page cache with time-bounded expiry and a per-URL attempt
/// counter. Independent of `InstrumentedCache`; the same wrapping pattern
/// applied to the fetch port instead of a store write.
pub struct PageCache {
    store: Arc<dyn KeyValueStore>,
    fetcher: Arc<dyn PageFetcher>,
    ttl: TtlMs,
}

impl PageCache {
    pub fn new(store: Arc<dyn KeyValueStore>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_ttl(store, fetcher, DEFAULT_PAGE_TTL)
    }

    pub fn with_ttl(
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn PageFetcher>,
        ttl: TtlMs,
    ) -> Self {
        Self {
            store,
            fetcher,
            ttl,
        }
    }

    /// Fetch `url`, serving a cached copy while one is unexpired.
    ///
    /// The attempt counter advances on every call, cache-cold or warm. Fetch
    /// failure propagates to the caller and caches nothing, so the next call
    /// retries.
    pub async fn fetch_cached(&self, url: &str) -> Result<String> {
        self.store.incr(&count_key(url)).await?;

        if let Some(cached) = self.store.get(&cached_key(url)).await? {
            debug!(url, "serving cached copy");
            return domain::decode_text(&cached);
        }

        debug!(url, "cache cold, fetching");
        let content = self.fetcher.fetch(url).await?;
        self.store
            .set_with_expiry(&cached_key(url), Bytes::from(content.clone()), self.ttl)
            .await?;
        Ok(content)
    }

    /// Number of fetch attempts recorded for `url`, absent as zero.
    pub async fn fetch_count(&self, url: &str) -> Result<i64> {
        match self.store.get(&count_key(url)).await? {
            Some(raw) => domain::decode_int(&raw),
            None => Ok(0),
        }
    }
}

/// reqwest-backed implementation of the fetch port.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(|e| Error::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        response.text().await.map_err(|e| Error::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedFetcher, StubStore};

    fn page_cache(store: &Arc<StubStore>, fetcher: &Arc<ScriptedFetcher>) -> PageCache {
        PageCache::new(
            store.clone() as Arc<dyn KeyValueStore>,
            fetcher.clone() as Arc<dyn PageFetcher>,
        )
    }

    #[tokio::test]
    async fn cold_fetch_caches_and_counts() {
        let store = Arc::new(StubStore::default());
        let fetcher = Arc::new(ScriptedFetcher::serving("<html>x</html>"));
        let cache = page_cache(&store, &fetcher);

        let content = cache.fetch_cached("http://x").await.unwrap();
        assert_eq!(content, "<html>x</html>");
        assert_eq!(fetcher.invocations(), 1);
        assert_eq!(store.counter("count:http://x"), 1);
        assert!(store.value("cached:http://x").is_some());
    }

    #[tokio::test]
    async fn warm_hit_skips_the_fetcher_but_still_counts() {
        let store = Arc::new(StubStore::default());
        let fetcher = Arc::new(ScriptedFetcher::serving("<html>x</html>"));
        let cache = page_cache(&store, &fetcher);

        cache.fetch_cached("http://x").await.unwrap();
        let content = cache.fetch_cached("http://x").await.unwrap();

        assert_eq!(content, "<html>x</html>");
        assert_eq!(fetcher.invocations(), 1);
        assert_eq!(store.counter("count:http://x"), 2);
        assert_eq!(cache.fetch_count("http://x").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn counters_are_tracked_per_url() {
        let store = Arc::new(StubStore::default());
        let fetcher = Arc::new(ScriptedFetcher::serving("page"));
        let cache = page_cache(&store, &fetcher);

        cache.fetch_cached("http://a").await.unwrap();
        cache.fetch_cached("http://a").await.unwrap();
        cache.fetch_cached("http://b").await.unwrap();

        assert_eq!(cache.fetch_count("http://a").await.unwrap(), 2);
        assert_eq!(cache.fetch_count("http://b").await.unwrap(), 1);
        assert_eq!(cache.fetch_count("http://never").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_propagates_and_caches_nothing() {
        let store = Arc::new(StubStore::default());
        let fetcher = Arc::new(ScriptedFetcher::failing());
        let cache = page_cache(&store, &fetcher);

        let result = cache.fetch_cached("http://x").await;
        assert!(matches!(result, Err(Error::Fetch { .. })));
        assert!(store.value("cached:http://x").is_none());
        // The attempt still counted; the next call retries the fetch.
        assert_eq!(store.counter("count:http://x"), 1);

        let retry = cache.fetch_cached("http://x").await;
        assert!(retry.is_err());
        assert_eq!(fetcher.invocations(), 2);
    }
}
