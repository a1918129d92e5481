//! Test doubles for the ports: a hashmap-backed store that records its
//! mutation sequence, and a scripted fetch collaborator. Expiry is not
//! modeled here; TTL behavior is exercised against the real engine in the
//! storage-engine crate.

use crate::ports::{KeyValueStore, PageFetcher};
use async_trait::async_trait;
use bytes::Bytes;
use shared::{Error, Result, TtlMs};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
pub struct StubStore {
    values: Mutex<HashMap<String, Bytes>>,
    lists: Mutex<HashMap<String, Vec<Bytes>>>,
    calls: Mutex<Vec<String>>,
    fail_set: AtomicBool,
}

impl StubStore {
    /// Recorded mutation sequence, e.g. `"incr Cache.store"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn counter(&self, key: &str) -> i64 {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .and_then(|raw| std::str::from_utf8(raw).ok()?.parse().ok())
            .unwrap_or(0)
    }

    pub fn value(&self, key: &str) -> Option<Bytes> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        self.lists
            .lock()
            .unwrap()
            .get(key)
            .map(|items| {
                items
                    .iter()
                    .map(|raw| String::from_utf8_lossy(raw).into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn list_len(&self, key: &str) -> usize {
        self.lists
            .lock()
            .unwrap()
            .get(key)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn seed_value(&self, key: &str, raw: &[u8]) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::copy_from_slice(raw));
    }

    pub fn seed_counter(&self, key: &str, count: i64) {
        self.seed_value(key, count.to_string().as_bytes());
    }

    pub fn seed_list_entry(&self, key: &str, entry: &str) {
        self.lists
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push(Bytes::copy_from_slice(entry.as_bytes()));
    }

    /// Make the next `set` fail with `StoreUnavailable`.
    pub fn fail_next_set(&self) {
        self.fail_set.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl KeyValueStore for StubStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        if self.fail_set.swap(false, Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("scripted set failure".to_string()));
        }
        self.record(format!("set {key}"));
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn set_with_expiry(&self, key: &str, value: Bytes, _ttl: TtlMs) -> Result<()> {
        self.record(format!("setex {key}"));
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.record(format!("incr {key}"));
        let mut values = self.values.lock().unwrap();
        let current = values
            .get(key)
            .and_then(|raw| std::str::from_utf8(raw).ok()?.parse::<i64>().ok())
            .unwrap_or(0);
        let next = current + 1;
        values.insert(key.to_string(), Bytes::from(next.to_string()));
        Ok(next)
    }

    async fn rpush(&self, key: &str, value: Bytes) -> Result<()> {
        self.record(format!("rpush {key} {}", String::from_utf8_lossy(&value)));
        self.lists
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push(value);
        Ok(())
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>> {
        let lists = self.lists.lock().unwrap();
        let Some(items) = lists.get(key) else {
            return Ok(Vec::new());
        };
        let len = items.len() as i64;
        let start = if start < 0 { start + len } else { start }.max(0);
        let stop = if stop < 0 { stop + len } else { stop }.min(len - 1);
        if len == 0 || start > stop {
            return Ok(Vec::new());
        }
        Ok(items[start as usize..=stop as usize].to_vec())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.values.lock().unwrap().contains_key(key)
            || self.lists.lock().unwrap().contains_key(key))
    }

    async fn flush_all(&self) -> Result<()> {
        self.record("flushall".to_string());
        self.values.lock().unwrap().clear();
        self.lists.lock().unwrap().clear();
        Ok(())
    }
}

pub struct ScriptedFetcher {
    content: Option<String>,
    hits: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn serving(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            hits: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            content: None,
            hits: AtomicUsize::new(0),
        }
    }

    pub fn invocations(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        match &self.content {
            Some(content) => Ok(content.clone()),
            None => Err(Error::Fetch {
                url: url.to_string(),
                reason: "scripted transport failure".to_string(),
            }),
        }
    }
}
