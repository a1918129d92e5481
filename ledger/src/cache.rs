use crate::domain::{self, TypedValue, ops};
use crate::ports::KeyValueStore;
use crate::tracking::CallTracker;
use bytes::Bytes;
use shared::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Typed value storage over the backing store, with call counting and call
/// history recorded around every `store` invocation.
///
/// Holds no state beyond the store handle; safe to share across tasks.
pub struct InstrumentedCache {
    store: Arc<dyn KeyValueStore>,
    tracker: CallTracker,
}

impl InstrumentedCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            tracker: CallTracker::new(store.clone(), ops::CACHE_STORE),
            store,
        }
    }

    /// Flush the backing store first, guaranteeing a clean state at
    /// initialization.
    pub async fn with_clean_store(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        store.flush_all().await?;
        Ok(Self::new(store))
    }

    /// Store a value under a freshly generated key and return the key.
    ///
    /// Key generation is trusted: a UUID v4 per call, no existence check.
    /// The call is tracked — counter and input history advance before the
    /// write, the key lands in the output history after it.
    pub async fn store(&self, value: impl Into<TypedValue>) -> Result<String> {
        let value = value.into();
        let store = Arc::clone(&self.store);
        self.tracker
            .track(value.render(), move || async move {
                let key = Uuid::new_v4().to_string();
                store.set(&key, value.encode()).await?;
                Ok(key)
            })
            .await
    }

    /// Read the raw bytes under `key`. Absent keys read as `None`.
    pub async fn retrieve(&self, key: &str) -> Result<Option<Bytes>> {
        self.store.get(key).await
    }

    /// Read and decode the value under `key`. An absent key short-circuits
    /// to `None` without invoking the decoder; present bytes that do not
    /// match the decoder's expected encoding fail with a decode error.
    pub async fn retrieve_with<T, F>(&self, key: &str, decoder: F) -> Result<Option<T>>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        match self.store.get(key).await? {
            Some(raw) => decoder(&raw).map(Some),
            None => Ok(None),
        }
    }

    pub async fn retrieve_text(&self, key: &str) -> Result<Option<String>> {
        self.retrieve_with(key, domain::decode_text).await
    }

    pub async fn retrieve_int(&self, key: &str) -> Result<Option<i64>> {
        self.retrieve_with(key, domain::decode_int).await
    }
}
