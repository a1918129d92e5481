use crate::domain::{self, OperationId};
use crate::ports::KeyValueStore;
use shared::Result;
use std::fmt;
use std::sync::Arc;

/// Read-only reconstruction of an operation's recorded call sequence.
pub struct ReplayEngine {
    store: Arc<dyn KeyValueStore>,
}

/// One operation's recorded calls, rendered by `Display` as a summary line
/// followed by one line per recorded call, in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallTrace {
    pub operation: &'static str,
    pub calls: i64,
    pub entries: Vec<(String, String)>,
}

impl fmt::Display for CallTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} was called {} times:", self.operation, self.calls)?;
        for (input, output) in &self.entries {
            writeln!(f, "{}({}) -> {}", self.operation, input, output)?;
        }
        Ok(())
    }
}

impl ReplayEngine {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reconstruct the call trace for `op`. Mutates nothing.
    ///
    /// Inputs and outputs are paired positionally up to the shorter history;
    /// a surplus entry (a crash mid-call leaves an input with no output) is
    /// inconclusive and not paired.
    pub async fn replay(&self, op: OperationId) -> Result<CallTrace> {
        let calls = self.call_count(op).await?;
        let inputs = self.store.lrange(&op.inputs_key(), 0, -1).await?;
        let outputs = self.store.lrange(&op.outputs_key(), 0, -1).await?;

        let entries = inputs
            .iter()
            .zip(outputs.iter())
            .map(|(input, output)| {
                (
                    String::from_utf8_lossy(input).into_owned(),
                    String::from_utf8_lossy(output).into_owned(),
                )
            })
            .collect();

        Ok(CallTrace {
            operation: op.name(),
            calls,
            entries,
        })
    }

    /// Read the call counter for `op`, treating an absent counter as zero.
    pub async fn call_count(&self, op: OperationId) -> Result<i64> {
        if !self.store.exists(op.counter_key()).await? {
            return Ok(0);
        }
        match self.store.get(op.counter_key()).await? {
            Some(raw) => domain::decode_int(&raw),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InstrumentedCache;
    use crate::domain::ops;
    use crate::test_support::StubStore;

    #[tokio::test]
    async fn replay_renders_recorded_calls_in_order() {
        let store = Arc::new(StubStore::default());
        let cache = InstrumentedCache::new(store.clone());
        let engine = ReplayEngine::new(store);

        let k1 = cache.store("a").await.unwrap();
        let k2 = cache.store(1i64).await.unwrap();
        let k3 = cache.store(2.5f64).await.unwrap();

        let trace = engine.replay(ops::CACHE_STORE).await.unwrap();
        let expected = format!(
            "Cache.store was called 3 times:\n\
             Cache.store(a) -> {k1}\n\
             Cache.store(1) -> {k2}\n\
             Cache.store(2.5) -> {k3}\n"
        );
        assert_eq!(trace.to_string(), expected);
    }

    #[tokio::test]
    async fn absent_counter_reads_as_zero() {
        let store = Arc::new(StubStore::default());
        let engine = ReplayEngine::new(store);

        let trace = engine.replay(ops::CACHE_STORE).await.unwrap();
        assert_eq!(trace.calls, 0);
        assert!(trace.entries.is_empty());
        assert_eq!(trace.to_string(), "Cache.store was called 0 times:\n");
    }

    #[tokio::test]
    async fn unmatched_input_is_not_paired() {
        let store = Arc::new(StubStore::default());

        // Two complete calls, then a third that died before its output was
        // recorded.
        store.seed_counter("Cache.store", 3);
        for input in ["a", "b", "c"] {
            store.seed_list_entry("Cache.store:inputs", input);
        }
        for output in ["k1", "k2"] {
            store.seed_list_entry("Cache.store:outputs", output);
        }

        let engine = ReplayEngine::new(store);
        let trace = engine.replay(ops::CACHE_STORE).await.unwrap();

        assert_eq!(trace.calls, 3);
        assert_eq!(
            trace.entries,
            vec![
                ("a".to_string(), "k1".to_string()),
                ("b".to_string(), "k2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn replay_does_not_mutate_history() {
        let store = Arc::new(StubStore::default());
        let cache = InstrumentedCache::new(store.clone());
        let engine = ReplayEngine::new(store.clone());

        cache.store("a").await.unwrap();
        engine.replay(ops::CACHE_STORE).await.unwrap();
        engine.replay(ops::CACHE_STORE).await.unwrap();

        assert_eq!(store.counter("Cache.store"), 1);
        assert_eq!(store.list_len("Cache.store:inputs"), 1);
        assert_eq!(store.list_len("Cache.store:outputs"), 1);
    }
}
