use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use ledger::ports::KeyValueStore;
use shared::{Error, Result, TtlMs};
use std::time::Instant;

/// What a key holds: a plain value (counters are values holding decimal
/// text) or an ordered list. Using a list operation on a value key, or the
/// reverse, is a `WrongType` error.
enum Slot {
    Value {
        data: Bytes,
        expires_at: Option<Instant>,
    },
    List(Vec<Bytes>),
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(
            self,
            Slot::Value {
                expires_at: Some(deadline),
                ..
            } if *deadline <= now
        )
    }
}

/// Dashmap-backed implementation of the backing-store port.
///
/// Per-key atomicity of `incr` and `rpush` comes from the dashmap entry API,
/// which holds the shard lock across the read-modify-write. Expired entries
/// are purged lazily on the next access to their key; there is no background
/// sweeper.
pub struct MemoryStore {
    map: DashMap<String, Slot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    fn purge_expired(&self, key: &str) {
        let now = Instant::now();
        self.map.remove_if(key, |_, slot| slot.is_expired(now));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &self.map.len())
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.purge_expired(key);
        match self.map.get(key).as_deref() {
            Some(Slot::Value { data, .. }) => Ok(Some(data.clone())),
            Some(Slot::List(_)) => Err(Error::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        self.map.insert(
            key.to_string(),
            Slot::Value {
                data: value,
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_with_expiry(&self, key: &str, value: Bytes, ttl: TtlMs) -> Result<()> {
        self.map.insert(
            key.to_string(),
            Slot::Value {
                data: value,
                expires_at: Some(Instant::now() + ttl.as_duration()),
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.purge_expired(key);
        let mut slot = self.map.entry(key.to_string()).or_insert_with(|| Slot::Value {
            data: Bytes::from_static(b"0"),
            expires_at: None,
        });
        match slot.value_mut() {
            Slot::Value { data, .. } => {
                let current: i64 = std::str::from_utf8(data)
                    .ok()
                    .and_then(|text| text.parse().ok())
                    .ok_or_else(|| Error::WrongType(key.to_string()))?;
                let next = current + 1;
                *data = Bytes::from(next.to_string());
                Ok(next)
            }
            Slot::List(_) => Err(Error::WrongType(key.to_string())),
        }
    }

    async fn rpush(&self, key: &str, value: Bytes) -> Result<()> {
        self.purge_expired(key);
        let mut slot = self
            .map
            .entry(key.to_string())
            .or_insert_with(|| Slot::List(Vec::new()));
        match slot.value_mut() {
            Slot::List(items) => {
                items.push(value);
                Ok(())
            }
            Slot::Value { .. } => Err(Error::WrongType(key.to_string())),
        }
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>> {
        self.purge_expired(key);
        match self.map.get(key).as_deref() {
            Some(Slot::List(items)) => {
                let len = items.len() as i64;
                let start = if start < 0 { start + len } else { start }.max(0);
                let stop = if stop < 0 { stop + len } else { stop }.min(len - 1);
                if len == 0 || start > stop {
                    return Ok(Vec::new());
                }
                Ok(items[start as usize..=stop as usize].to_vec())
            }
            Some(Slot::Value { .. }) => Err(Error::WrongType(key.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.purge_expired(key);
        Ok(self.map.contains_key(key))
    }

    async fn flush_all(&self) -> Result<()> {
        self.map.clear();
        Ok(())
    }
}
