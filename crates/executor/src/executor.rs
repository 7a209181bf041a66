use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use requeue_core::{DlqItem, ItemOutcome, ItemStatus, RunSummary};
use requeue_provider::{ProviderError, RetryDispatch, TaskEngine};
use requeue_store::ReplayStore;

use crate::breaker::BreakerTally;
use crate::config::ExecutorConfig;

/// Result of one pass over a selected batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// One entry per processed item, in processing order.
    pub outcomes: Vec<ItemOutcome>,
    pub summary: RunSummary,
    /// `true` when the circuit breaker stopped the loop early.
    pub tripped: bool,
}

/// Dispatches retries for DLQ items one at a time and schedules backoff.
///
/// Items are processed strictly in order. After each item the failure tally
/// is checked and the loop stops once it exceeds the configured share of
/// the batch; the remaining items are left untouched.
pub struct RetryExecutor {
    store: Arc<dyn ReplayStore>,
    engine: Arc<dyn TaskEngine>,
    config: ExecutorConfig,
}

impl RetryExecutor {
    pub fn new(
        store: Arc<dyn ReplayStore>,
        engine: Arc<dyn TaskEngine>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            store,
            engine,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Process `items` sequentially until done or the breaker trips.
    #[instrument(skip(self, items), fields(batch_size = items.len()))]
    pub async fn run(&self, items: &[DlqItem]) -> BatchReport {
        let batch_size = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let mut tally = BreakerTally::new(batch_size, self.config.breaker_failure_ratio);
        let mut outcomes = Vec::with_capacity(items.len());
        let mut tripped = false;

        for item in items {
            let outcome = self.process_item(item).await;
            tally.record(outcome.status);
            outcomes.push(outcome);

            if tally.is_tripped() {
                let summary = tally.summary();
                warn!(
                    processed = summary.total_processed,
                    failed = summary.failed,
                    batch_size,
                    "circuit breaker tripped, stopping batch"
                );
                tripped = true;
                break;
            }
        }

        BatchReport {
            outcomes,
            summary: tally.summary(),
            tripped,
        }
    }

    /// Drive a single item through lookup, pause check, dispatch, and
    /// retry-state update. Never returns an error: every failure becomes an
    /// [`ItemOutcome`].
    #[instrument(skip(self, item), fields(dlq_id = %item.id, company_id = %item.company_id))]
    pub async fn process_item(&self, item: &DlqItem) -> ItemOutcome {
        let task = match self.store.get_task(&item.original_task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                let message = format!("original task {} not found", item.original_task_id);
                return self.fail(item, ItemStatus::RetryError, message).await;
            }
            Err(e) => {
                let message = format!("task lookup failed: {e}");
                return self.fail(item, ItemStatus::RetryError, message).await;
            }
        };

        match self.store.is_tenant_paused(&item.company_id).await {
            Ok(false) => {}
            Ok(true) => {
                debug!("tenant paused, skipping item");
                return outcome(
                    item,
                    ItemStatus::RetryError,
                    format!("processing is paused for tenant {}", item.company_id),
                    None,
                );
            }
            Err(e) => {
                let message = format!("tenant status lookup failed: {e}");
                return self.fail(item, ItemStatus::RetryError, message).await;
            }
        }

        let request = RetryDispatch::for_task(&task, &item.id);
        match self.engine.dispatch(&request).await {
            Ok(receipt) => {
                let retry_count = item.retry_count.saturating_add(1);
                if let Err(e) = self
                    .store
                    .update_dlq_retry_state(&item.id, retry_count, item.retry_after)
                    .await
                {
                    warn!(error = %e, "retry accepted but retry state could not be saved");
                }
                let message = match receipt.execution_id {
                    Some(id) => format!("retry dispatched (execution {id})"),
                    None => "retry dispatched".to_owned(),
                };
                outcome(item, ItemStatus::RetriedSuccessfully, message, None)
            }
            Err(ProviderError::Rejected(text)) => {
                self.fail(item, ItemStatus::RetryFailed, text).await
            }
            Err(e) => {
                let message = format!("dispatch error: {e}");
                self.fail(item, ItemStatus::RetryError, message).await
            }
        }
    }

    /// Increment the retry count and push `retry_after` out by the backoff
    /// delay for the new count.
    async fn fail(&self, item: &DlqItem, status: ItemStatus, message: String) -> ItemOutcome {
        let retry_count = item.retry_count.saturating_add(1);
        let next_retry_at = self.config.backoff.next_retry_at(Utc::now(), retry_count);

        match self
            .store
            .update_dlq_retry_state(&item.id, retry_count, next_retry_at)
            .await
        {
            Ok(()) => {
                info!(status = ?status, retry_count, %next_retry_at, "item rescheduled");
                outcome(item, status, message, Some(next_retry_at))
            }
            Err(e) => {
                warn!(error = %e, "failed to schedule backoff");
                outcome(
                    item,
                    ItemStatus::RetryError,
                    format!("{message}; backoff not scheduled: {e}"),
                    None,
                )
            }
        }
    }
}

fn outcome(
    item: &DlqItem,
    status: ItemStatus,
    message: String,
    next_retry_at: Option<chrono::DateTime<Utc>>,
) -> ItemOutcome {
    ItemOutcome {
        dlq_id: item.id.clone(),
        original_task_id: item.original_task_id.clone(),
        status,
        message,
        next_retry_at,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;

    use requeue_core::TaskRecord;
    use requeue_provider::{DispatchReceipt, HttpTaskEngine, HttpTaskEngineConfig};
    use requeue_store_memory::MemoryReplayStore;

    use super::*;

    /// Engine answering from a script; accepts once the script runs out.
    #[derive(Default)]
    struct ScriptedEngine {
        script: Mutex<VecDeque<Result<(), String>>>,
        calls: Mutex<Vec<RetryDispatch>>,
    }

    impl ScriptedEngine {
        fn failing_first(n: usize) -> Self {
            let engine = Self::default();
            engine
                .script
                .lock()
                .unwrap()
                .extend((0..n).map(|i| Err(format!("engine error {i}"))));
            engine
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TaskEngine for ScriptedEngine {
        async fn dispatch(
            &self,
            request: &RetryDispatch,
        ) -> Result<DispatchReceipt, ProviderError> {
            self.calls.lock().unwrap().push(request.clone());
            match self.script.lock().unwrap().pop_front() {
                Some(Err(text)) => Err(ProviderError::Rejected(text)),
                _ => Ok(DispatchReceipt::default()),
            }
        }
    }

    struct UnreachableEngine;

    #[async_trait]
    impl TaskEngine for UnreachableEngine {
        async fn dispatch(&self, _: &RetryDispatch) -> Result<DispatchReceipt, ProviderError> {
            Err(ProviderError::Connection("connection refused".into()))
        }
    }

    fn seed(store: &MemoryReplayStore, n: usize) -> Vec<DlqItem> {
        let past = Utc::now() - Duration::hours(1);
        (0..n)
            .map(|i| {
                let item = DlqItem {
                    id: format!("dlq-{i:02}"),
                    original_task_id: format!("task-{i:02}"),
                    company_id: "c1".into(),
                    agent_name: "agent".into(),
                    error_type: "timeout".into(),
                    error_message: "boom".into(),
                    retry_count: 0,
                    max_retries: 5,
                    retry_after: past,
                    priority: i32::try_from(i).unwrap(),
                };
                store.insert_task(TaskRecord {
                    id: item.original_task_id.clone(),
                    company_id: "c1".into(),
                    agent_name: "agent".into(),
                    task_type: "sync".into(),
                    payload: serde_json::json!({"i": i}),
                });
                store.insert_dlq_item(item.clone());
                item
            })
            .collect()
    }

    fn executor(store: Arc<MemoryReplayStore>, engine: Arc<dyn TaskEngine>) -> RetryExecutor {
        RetryExecutor::new(store, engine, ExecutorConfig::default())
    }

    #[tokio::test]
    async fn breaker_trips_after_third_failure_of_ten() {
        let store = Arc::new(MemoryReplayStore::new());
        let items = seed(&store, 10);
        let engine = Arc::new(ScriptedEngine::failing_first(3));
        let report = executor(Arc::clone(&store), engine.clone()).run(&items).await;

        assert!(report.tripped);
        assert_eq!(
            report.summary,
            RunSummary {
                total_processed: 3,
                successful: 0,
                failed: 3,
            }
        );
        assert_eq!(engine.call_count(), 3);
        assert!(
            report
                .outcomes
                .iter()
                .all(|o| o.status == ItemStatus::RetryFailed)
        );

        // Unprocessed items keep their prior state.
        for untouched in &items[3..] {
            let stored = store.get_dlq_item(&untouched.id).await.unwrap().unwrap();
            assert_eq!(&stored, untouched);
        }
    }

    #[tokio::test]
    async fn success_increments_count_and_keeps_retry_after() {
        let store = Arc::new(MemoryReplayStore::new());
        let items = seed(&store, 1);
        let report = executor(Arc::clone(&store), Arc::new(ScriptedEngine::default()))
            .run(&items)
            .await;

        assert!(!report.tripped);
        assert_eq!(report.summary.successful, 1);
        assert_eq!(report.outcomes[0].status, ItemStatus::RetriedSuccessfully);
        assert!(report.outcomes[0].next_retry_at.is_none());

        let stored = store.get_dlq_item("dlq-00").await.unwrap().unwrap();
        assert_eq!(stored.retry_count, 1);
        assert_eq!(stored.retry_after, items[0].retry_after);
    }

    #[tokio::test]
    async fn rejection_schedules_backoff_from_new_count() {
        let store = Arc::new(MemoryReplayStore::new());
        let mut items = seed(&store, 1);
        items[0].retry_count = 2;
        store.insert_dlq_item(items[0].clone());

        let before = Utc::now();
        let outcome = executor(Arc::clone(&store), Arc::new(ScriptedEngine::failing_first(1)))
            .process_item(&items[0])
            .await;

        assert_eq!(outcome.status, ItemStatus::RetryFailed);
        assert_eq!(outcome.message, "engine error 0");
        let stored = store.get_dlq_item("dlq-00").await.unwrap().unwrap();
        assert_eq!(stored.retry_count, 3);
        let delay = stored.retry_after - before;
        assert!(delay >= Duration::minutes(4));
        assert!(delay < Duration::minutes(4) + Duration::seconds(5));
        assert_eq!(outcome.next_retry_at, Some(stored.retry_after));
    }

    #[tokio::test]
    async fn consecutive_failures_follow_backoff_schedule() {
        let store = Arc::new(MemoryReplayStore::new());
        seed(&store, 1);
        let exec = executor(Arc::clone(&store), Arc::new(ScriptedEngine::failing_first(6)));

        for n in 1..=6u32 {
            let current = store.get_dlq_item("dlq-00").await.unwrap().unwrap();
            let before = Utc::now();
            exec.process_item(&current).await;
            let stored = store.get_dlq_item("dlq-00").await.unwrap().unwrap();
            assert_eq!(stored.retry_count, n);

            let expected = Duration::minutes(i64::from(crate::backoff_minutes(n)));
            let delay = stored.retry_after - before;
            assert!(delay >= expected && delay < expected + Duration::seconds(5));
        }
    }

    #[tokio::test]
    async fn missing_task_is_retry_error_with_backoff() {
        let store = Arc::new(MemoryReplayStore::new());
        let items = seed(&store, 1);
        let mut orphan = items[0].clone();
        orphan.id = "dlq-orphan".into();
        orphan.original_task_id = "task-gone".into();
        store.insert_dlq_item(orphan.clone());

        let engine = Arc::new(ScriptedEngine::default());
        let outcome = executor(Arc::clone(&store), engine.clone())
            .process_item(&orphan)
            .await;

        assert_eq!(outcome.status, ItemStatus::RetryError);
        assert!(outcome.message.contains("task-gone"));
        assert!(outcome.next_retry_at.is_some());
        assert_eq!(engine.call_count(), 0);
        let stored = store.get_dlq_item("dlq-orphan").await.unwrap().unwrap();
        assert_eq!(stored.retry_count, 1);
    }

    #[tokio::test]
    async fn paused_tenant_is_retry_error_without_mutation() {
        let store = Arc::new(MemoryReplayStore::new());
        let items = seed(&store, 1);
        store.set_tenant_paused("c1", true);

        let engine = Arc::new(ScriptedEngine::default());
        let outcome = executor(Arc::clone(&store), engine.clone())
            .process_item(&items[0])
            .await;

        assert_eq!(outcome.status, ItemStatus::RetryError);
        assert!(outcome.message.contains("paused"));
        assert!(outcome.next_retry_at.is_none());
        assert_eq!(engine.call_count(), 0);
        let stored = store.get_dlq_item("dlq-00").await.unwrap().unwrap();
        assert_eq!(stored, items[0]);
    }

    #[tokio::test]
    async fn transport_error_is_retry_error_with_backoff() {
        let store = Arc::new(MemoryReplayStore::new());
        let items = seed(&store, 1);
        let outcome = executor(Arc::clone(&store), Arc::new(UnreachableEngine))
            .process_item(&items[0])
            .await;

        assert_eq!(outcome.status, ItemStatus::RetryError);
        assert!(outcome.message.contains("connection refused"));
        assert!(outcome.next_retry_at.is_some());
    }

    /// Answers one HTTP request with `500` and a JSON error body.
    async fn failing_engine_server() -> (String, tokio::task::JoinHandle<()>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/dispatch", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if n == 0 || request_complete(&buf) {
                    break;
                }
            }
            let body = r#"{"error":"agent pool exhausted"}"#;
            let response = format!(
                "HTTP/1.1 500 Internal Server Error\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        (url, handle)
    }

    fn request_complete(buf: &[u8]) -> bool {
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        buf.len() >= end + 4 + body_len
    }

    #[tokio::test]
    async fn engine_server_error_is_retry_failed_with_engine_text() {
        let store = Arc::new(MemoryReplayStore::new());
        let items = seed(&store, 1);
        let (url, server) = failing_engine_server().await;
        let engine = HttpTaskEngine::new(HttpTaskEngineConfig::new(url)).unwrap();

        let outcome = executor(Arc::clone(&store), Arc::new(engine))
            .process_item(&items[0])
            .await;
        server.await.unwrap();

        assert_eq!(outcome.status, ItemStatus::RetryFailed);
        assert_eq!(outcome.message, "agent pool exhausted");
        assert!(outcome.next_retry_at.is_some());
        let stored = store.get_dlq_item("dlq-00").await.unwrap().unwrap();
        assert_eq!(stored.retry_count, 1);
    }

    #[tokio::test]
    async fn dispatch_carries_dlq_id_and_retry_marker() {
        let store = Arc::new(MemoryReplayStore::new());
        let items = seed(&store, 2);
        let engine = Arc::new(ScriptedEngine::default());
        executor(Arc::clone(&store), engine.clone()).run(&items).await;

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].dlq_id, "dlq-00");
        assert_eq!(calls[1].task_id, "task-01");
        assert!(calls.iter().all(|c| c.is_retry));
    }
}
