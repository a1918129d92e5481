//! Runnable tour of the instrumented cache: store a few values, replay the
//! recorded calls, then exercise the page cache against a real URL.
//!
//! ```sh
//! cargo run --example call_trace
//! ```

use ledger::domain::ops;
use ledger::ports::KeyValueStore;
use ledger::{HttpFetcher, InstrumentedCache, PageCache, ReplayEngine};
use shared::config::Config;
use std::sync::Arc;
use storage_engine::MemoryStore;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> shared::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }
    let config = Config::from_env();

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let cache = if config.flush_on_start {
        InstrumentedCache::with_clean_store(store.clone()).await?
    } else {
        InstrumentedCache::new(store.clone())
    };

    let k1 = cache.store("foo").await?;
    let k2 = cache.store(42i64).await?;
    let k3 = cache.store(2.5f64).await?;
    info!("stored three values under {k1}, {k2}, {k3}");
    info!("first value reads back as {:?}", cache.retrieve_text(&k1).await?);

    let engine = ReplayEngine::new(store.clone());
    print!("{}", engine.replay(ops::CACHE_STORE).await?);

    let pages = PageCache::with_ttl(store, Arc::new(HttpFetcher::new()), config.page_ttl);
    let url =
        std::env::var("LEDGER_DEMO_URL").unwrap_or_else(|_| "http://example.com".to_string());

    let content = pages.fetch_cached(&url).await?;
    info!("fetched {} bytes from {url}", content.len());
    let cached = pages.fetch_cached(&url).await?;
    info!(
        "second call served {} bytes from cache, {} attempts recorded",
        cached.len(),
        pages.fetch_count(&url).await?
    );

    Ok(())
}
