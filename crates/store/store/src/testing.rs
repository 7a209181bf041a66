use chrono::{Duration, Utc};

use requeue_core::{RateLimitWindow, ReplayRun, RunStatus, RunSummary};

use crate::error::StoreError;
use crate::store::ReplayStore;

/// Run the replay store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
/// Only trait-level behaviour is exercised; seeding DLQ items, tasks, and
/// roles is backend-specific and covered by each backend's own tests.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn ReplayStore) -> Result<(), StoreError> {
    test_missing_lookups(store).await?;
    test_create_and_find_run(store).await?;
    test_duplicate_run_conflicts(store).await?;
    test_same_key_different_scope(store).await?;
    test_update_run(store).await?;
    test_rate_limit_window_roundtrip(store).await?;
    test_update_missing_dlq_item(store).await?;
    Ok(())
}

fn run(id: &str, key: &str, scope: &str) -> ReplayRun {
    ReplayRun::pending(id, key, scope, "conformance", "hash", Utc::now())
}

async fn test_missing_lookups(store: &dyn ReplayStore) -> Result<(), StoreError> {
    assert!(store.get_run("missing-run").await?.is_none());
    assert!(store.find_run("missing-key", "all").await?.is_none());
    assert!(store.get_task("missing-task").await?.is_none());
    assert!(store.get_dlq_item("missing-item").await?.is_none());
    assert!(store.get_rate_limit_window("missing:window").await?.is_none());
    assert!(!store.is_tenant_paused("missing-tenant").await?);
    assert!(!store.is_super_admin("missing-user").await?);
    assert!(!store.is_company_admin("missing-user", "missing-tenant").await?);
    Ok(())
}

async fn test_create_and_find_run(store: &dyn ReplayStore) -> Result<(), StoreError> {
    let created = run("conf-run-1", "conf-key-1", "all");
    store.create_run(&created).await?;

    let found = store.find_run("conf-key-1", "all").await?;
    assert_eq!(found.as_ref().map(|r| r.id.as_str()), Some("conf-run-1"));

    let by_id = store.get_run("conf-run-1").await?;
    assert_eq!(by_id.map(|r| r.status), Some(RunStatus::Pending));
    Ok(())
}

async fn test_duplicate_run_conflicts(store: &dyn ReplayStore) -> Result<(), StoreError> {
    store.create_run(&run("conf-run-2", "conf-key-2", "c1")).await?;
    let err = store
        .create_run(&run("conf-run-3", "conf-key-2", "c1"))
        .await
        .expect_err("duplicate idempotency pair must conflict");
    assert!(err.is_conflict(), "expected conflict, got {err:?}");
    assert!(store.get_run("conf-run-3").await?.is_none());
    Ok(())
}

async fn test_same_key_different_scope(store: &dyn ReplayStore) -> Result<(), StoreError> {
    store.create_run(&run("conf-run-4", "conf-key-4", "c1")).await?;
    store.create_run(&run("conf-run-5", "conf-key-4", "c2")).await?;
    let c2 = store.find_run("conf-key-4", "c2").await?;
    assert_eq!(c2.map(|r| r.id), Some("conf-run-5".to_owned()));
    Ok(())
}

async fn test_update_run(store: &dyn ReplayStore) -> Result<(), StoreError> {
    let mut r = run("conf-run-6", "conf-key-6", "all");
    store.create_run(&r).await?;
    r.finalize(
        RunStatus::Completed,
        RunSummary {
            total_processed: 3,
            successful: 2,
            failed: 1,
        },
        Utc::now(),
    );
    store.update_run(&r).await?;

    let stored = store
        .get_run("conf-run-6")
        .await?
        .expect("updated run should exist");
    assert_eq!(stored.status, RunStatus::Completed);
    assert_eq!(stored.summary(), r.summary());
    assert!(stored.completed_at.is_some());
    Ok(())
}

async fn test_rate_limit_window_roundtrip(store: &dyn ReplayStore) -> Result<(), StoreError> {
    let now = Utc::now();
    let mut window = RateLimitWindow::open("conf:127.0.0.1", now, Duration::minutes(5));
    store.put_rate_limit_window(&window).await?;

    window.request_count = 2;
    store.put_rate_limit_window(&window).await?;

    let stored = store
        .get_rate_limit_window("conf:127.0.0.1")
        .await?
        .expect("window should exist");
    assert_eq!(stored.request_count, 2);
    Ok(())
}

async fn test_update_missing_dlq_item(store: &dyn ReplayStore) -> Result<(), StoreError> {
    let result = store
        .update_dlq_retry_state("conf-missing-item", 1, Utc::now())
        .await;
    assert!(
        matches!(result, Err(StoreError::NotFound(_))),
        "updating a missing item should report NotFound"
    );
    Ok(())
}
