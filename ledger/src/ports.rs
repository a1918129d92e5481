use async_trait::async_trait;
use bytes::Bytes;
use shared::{Result, TtlMs};

// Ports are the pluggable extension points for the backing store and the
// page-fetch collaborator

/// Port over the backing key-value store.
///
/// Each method is individually atomic at the store; nothing here composes
/// two primitives atomically. Callers that sequence primitives must tolerate
/// partial completion.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the raw bytes under `key`. Absent keys (including expired ones)
    /// read as `None`, never as an error.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Bytes) -> Result<()>;

    /// Write `value` under `key` with a time-to-live. Once the TTL elapses,
    /// `get` and `exists` observe absence.
    async fn set_with_expiry(&self, key: &str, value: Bytes, ttl: TtlMs) -> Result<()>;

    /// Atomically increment the counter under `key`, creating it at 0 first
    /// if absent, and return the new value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Append `value` to the tail of the list under `key`, creating the list
    /// if absent.
    async fn rpush(&self, key: &str, value: Bytes) -> Result<()>;

    /// Inclusive range read over the list under `key`. Negative indices
    /// count from the tail, so `(0, -1)` reads the whole list. An absent key
    /// reads as the empty list.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Clear every key. Used only to guarantee a clean state at cache
    /// initialization.
    async fn flush_all(&self) -> Result<()>;
}

/// Port for the page-fetch collaborator. Transport failures surface as
/// `Error::Fetch` and are never swallowed by the page cache.
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<String>;
}
