use crate::domain::OperationId;
use crate::ports::KeyValueStore;
use bytes::Bytes;
use shared::Result;
use std::future::Future;
use std::sync::Arc;

/// Explicit instrumentation wrapper for one named operation.
///
/// `track` runs the pre-hook (counter increment, input append), awaits the
/// wrapped operation, then the post-hook (output append). The pre-hook runs
/// before the wrapped operation, so the counter and input history reflect
/// attempted calls: a wrapped operation that fails leaves the counter
/// advanced and an unmatched input entry behind. Replay tolerates the
/// unmatched tail. This ordering is part of the observable contract and must
/// not be reordered around the write.
pub struct CallTracker {
    store: Arc<dyn KeyValueStore>,
    op: OperationId,
}

impl CallTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, op: OperationId) -> Self {
        Self { store, op }
    }

    pub fn operation(&self) -> OperationId {
        self.op
    }

    /// Record one invocation of the wrapped operation.
    ///
    /// `input` is the rendered argument text appended to the input history;
    /// the operation's output is rendered through `Display` and appended to
    /// the output history after it completes.
    pub async fn track<T, F, Fut>(&self, input: String, operation: F) -> Result<T>
    where
        T: std::fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.store.incr(self.op.counter_key()).await?;
        self.store
            .rpush(&self.op.inputs_key(), Bytes::from(input))
            .await?;

        let output = operation().await?;

        self.store
            .rpush(&self.op.outputs_key(), Bytes::from(output.to_string()))
            .await?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ops;
    use crate::test_support::StubStore;
    use shared::Error;

    #[tokio::test]
    async fn pre_hook_runs_before_the_wrapped_operation() {
        let store = Arc::new(StubStore::default());
        let tracker = CallTracker::new(store.clone(), ops::CACHE_STORE);

        let result = tracker
            .track("input".to_string(), || async {
                Err::<String, _>(Error::Internal("write failed".to_string()))
            })
            .await;

        assert!(result.is_err());
        // Attempt was still counted and its input recorded, with no output.
        assert_eq!(store.counter("Cache.store"), 1);
        assert_eq!(store.list_len("Cache.store:inputs"), 1);
        assert_eq!(store.list_len("Cache.store:outputs"), 0);
    }

    #[tokio::test]
    async fn output_is_appended_after_success() {
        let store = Arc::new(StubStore::default());
        let tracker = CallTracker::new(store.clone(), ops::CACHE_STORE);

        let output = tracker
            .track("foo".to_string(), || async { Ok("k1".to_string()) })
            .await
            .unwrap();

        assert_eq!(output, "k1");
        assert_eq!(
            store.calls(),
            vec![
                "incr Cache.store",
                "rpush Cache.store:inputs foo",
                "rpush Cache.store:outputs k1",
            ]
        );
    }

    #[tokio::test]
    async fn histories_stay_aligned_across_calls() {
        let store = Arc::new(StubStore::default());
        let tracker = CallTracker::new(store.clone(), ops::CACHE_STORE);

        for i in 0..3 {
            tracker
                .track(format!("in{i}"), || async move { Ok(format!("out{i}")) })
                .await
                .unwrap();
        }

        assert_eq!(store.counter("Cache.store"), 3);
        assert_eq!(store.list_len("Cache.store:inputs"), 3);
        assert_eq!(store.list_len("Cache.store:outputs"), 3);
    }
}
