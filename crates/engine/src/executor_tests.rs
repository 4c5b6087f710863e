//! Tests for the run executor.
//!
//! Most use `MockStep` over a `MemoryStore`; one drives the whole state
//! machine against in-memory SQLite to cover the SQL ledger end to end.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use db::{MemoryStore, RunLedger, SqlStore, Store, WorkflowStore};
use steps::mock::MockStep;

use crate::{EngineError, RunExecutor, RunStatus, Workflow};

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn workflow(store: &dyn Store, steps: &[&str]) -> Workflow {
    store.create_workflow("test-linear", &labels(steps)).await.unwrap()
}

fn executor(store: &Arc<MemoryStore>, runner: &MockStep) -> RunExecutor {
    RunExecutor::new(store.clone(), Arc::new(runner.clone()))
}

async fn messages(store: &dyn Store, run_id: i64) -> Vec<String> {
    store
        .get_logs(run_id)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.message)
        .collect()
}

/// Yield to spawned tasks until `done` holds.
async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

// ============================================================
// Completion
// ============================================================

#[tokio::test]
async fn three_step_workflow_completes_with_two_logs_per_step() {
    let store = Arc::new(MemoryStore::new());
    let wf = workflow(store.as_ref(), &["build", "test", "ship"]).await;
    let runner = MockStep::succeeding();

    let run = executor(&store, &runner).trigger(wf.id).await.unwrap();

    assert_eq!(run.id, 1);
    assert_eq!(run.status, RunStatus::Completed);
    let finished = run.finished_at.expect("completed run has finished_at");
    assert!(run.started_at <= finished);

    assert_eq!(
        messages(store.as_ref(), run.id).await,
        vec![
            "Step 1/3: build - started",
            "Step 1/3: build - completed",
            "Step 2/3: test - started",
            "Step 2/3: test - completed",
            "Step 3/3: ship - started",
            "Step 3/3: ship - completed",
        ]
    );

    // Steps ran in declared order, each exactly once.
    assert_eq!(runner.calls(), vec!["build", "test", "ship"]);
}

#[tokio::test]
async fn repeated_step_labels_each_run() {
    let store = Arc::new(MemoryStore::new());
    let wf = workflow(store.as_ref(), &["sync", "sync"]).await;
    let runner = MockStep::succeeding();

    let run = executor(&store, &runner).trigger(wf.id).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(runner.call_count(), 2);
    assert_eq!(store.get_logs(run.id).await.unwrap().len(), 4);
}

// ============================================================
// Failure
// ============================================================

#[tokio::test]
async fn failing_step_stops_the_run() {
    let store = Arc::new(MemoryStore::new());
    let wf = workflow(store.as_ref(), &["ok", "boom", "never"]).await;
    let runner = MockStep::succeeding().failing_on("boom", "something broke irreparably");

    let run = executor(&store, &runner).trigger(wf.id).await.unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.finished_at.is_some());
    assert_eq!(
        messages(store.as_ref(), run.id).await,
        vec![
            "Step 1/3: ok - started",
            "Step 1/3: ok - completed",
            "Step 2/3: boom - started",
            "ERROR: something broke irreparably",
        ]
    );

    // 'never' was never executed.
    assert_eq!(runner.calls(), vec!["ok", "boom"]);
}

#[tokio::test]
async fn failure_on_step_k_leaves_two_k_logs() {
    let steps = ["s1", "s2", "s3", "s4", "s5"];

    for (k, failing) in steps.iter().enumerate().map(|(i, s)| (i + 1, *s)) {
        let store = Arc::new(MemoryStore::new());
        let wf = workflow(store.as_ref(), &steps).await;
        let runner = MockStep::succeeding().failing_on(failing, format!("{failing} exploded"));

        let run = executor(&store, &runner).trigger(wf.id).await.unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        let logs = messages(store.as_ref(), run.id).await;
        assert_eq!(logs.len(), 2 * k, "failing at step {k}");
        assert_eq!(logs.last().unwrap(), &format!("ERROR: {failing} exploded"));
        assert_eq!(runner.call_count(), k);
    }
}

// ============================================================
// Lifecycle observed while a run is in flight
// ============================================================

#[tokio::test]
async fn progress_is_visible_while_the_run_is_in_flight() {
    let store = Arc::new(MemoryStore::new());
    let wf = workflow(store.as_ref(), &["build", "test", "ship"]).await;
    let (runner, gate) = MockStep::succeeding().gated();
    let exec = executor(&store, &runner);

    let wf_id = wf.id;
    let handle = tokio::spawn(async move { exec.trigger(wf_id).await });

    // Held inside step 1.
    wait_until(|| runner.call_count() == 1).await;
    let (run, logs) = store.snapshot(1).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert!(run.finished_at.is_none());
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].message, "Step 1/3: build - started");

    // Held inside step 2.
    gate.add_permits(1);
    wait_until(|| runner.call_count() == 2).await;
    let (run, logs) = store.snapshot(1).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert!(run.finished_at.is_none());
    assert_eq!(logs.len(), 3);

    gate.add_permits(2);
    let run = handle.await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(store.get_logs(run.id).await.unwrap().len(), 6);
}

#[tokio::test]
async fn concurrent_runs_progress_independently() {
    let store = Arc::new(MemoryStore::new());
    let wf = workflow(store.as_ref(), &["a", "b"]).await;
    let (held_runner, gate) = MockStep::succeeding().gated();
    let held = executor(&store, &held_runner);
    let free = executor(&store, &MockStep::succeeding());

    let wf_id = wf.id;
    let held_handle = tokio::spawn(async move { held.trigger(wf_id).await });
    wait_until(|| held_runner.call_count() == 1).await;

    // A second run of the same workflow finishes while the first is stuck.
    let finished = free.trigger(wf_id).await.unwrap();
    assert_eq!(finished.status, RunStatus::Completed);
    assert_eq!(store.get_logs(finished.id).await.unwrap().len(), 4);

    let stuck = store.get_run(1).await.unwrap().unwrap();
    assert_eq!(stuck.status, RunStatus::Running);

    gate.add_permits(2);
    let run = held_handle.await.unwrap().unwrap();
    assert_eq!(run.id, 1);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(store.get_logs(run.id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn dropping_the_trigger_future_does_not_stop_the_run() {
    let store = Arc::new(MemoryStore::new());
    let wf = workflow(store.as_ref(), &["build", "test", "ship"]).await;
    let (runner, gate) = MockStep::succeeding().gated();
    let exec = executor(&store, &runner);

    // Give up on the caller side while step 1 is held.
    let abandoned = tokio::time::timeout(Duration::from_millis(50), exec.trigger(wf.id)).await;
    assert!(abandoned.is_err());
    assert_eq!(runner.call_count(), 1);

    gate.add_permits(3);
    wait_until(|| runner.call_count() == 3).await;
    for _ in 0..10_000 {
        let run = store.get_run(1).await.unwrap().unwrap();
        if run.status.is_terminal() {
            break;
        }
        tokio::task::yield_now().await;
    }

    let (run, logs) = store.snapshot(1).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.finished_at.is_some());
    assert_eq!(logs.len(), 6);
}

// ============================================================
// Errors
// ============================================================

#[tokio::test]
async fn missing_workflow_creates_no_run() {
    let store = Arc::new(MemoryStore::new());
    let runner = MockStep::succeeding();

    let err = executor(&store, &runner).trigger(999).await.unwrap_err();

    assert!(matches!(err, EngineError::NotFound { entity: "workflow", id: 999 }));
    assert!(store.get_run(1).await.unwrap().is_none());
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn executing_a_finished_run_is_an_invalid_transition() {
    let store = Arc::new(MemoryStore::new());
    let wf = workflow(store.as_ref(), &["only"]).await;
    let runner = MockStep::succeeding();
    let exec = executor(&store, &runner);

    let run = exec.trigger(wf.id).await.unwrap();
    let err = exec.execute(&wf, run.id).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::InvalidTransition { from: RunStatus::Completed, to: RunStatus::Running, .. }
    ));
    // Nothing else ran and nothing else was logged.
    assert_eq!(runner.call_count(), 1);
    assert_eq!(store.get_logs(run.id).await.unwrap().len(), 2);
}

// ============================================================
// SQL-backed ledger
// ============================================================

async fn with_sql_store<F, Fut>(test: F)
where
    F: FnOnce(Arc<SqlStore>) -> Fut,
    Fut: Future<Output = ()>,
{
    let pool = db::pool::create_pool("sqlite::memory:", 1).await.unwrap();
    db::pool::run_migrations(&pool).await.unwrap();
    test(Arc::new(SqlStore::new(pool))).await;
}

#[tokio::test]
async fn sql_ledger_records_completed_and_failed_runs() {
    with_sql_store(|store| async move {
        let wf = workflow(store.as_ref(), &["build", "test", "ship"]).await;

        let ok = RunExecutor::new(store.clone(), Arc::new(MockStep::succeeding()));
        let run = ok.trigger(wf.id).await.unwrap();
        assert_eq!((run.id, run.status), (1, RunStatus::Completed));
        assert_eq!(messages(store.as_ref(), run.id).await.len(), 6);

        let failing = RunExecutor::new(
            store.clone(),
            Arc::new(MockStep::succeeding().failing_on("test", "tests are red")),
        );
        let run = failing.trigger(wf.id).await.unwrap();
        assert_eq!((run.id, run.status), (2, RunStatus::Failed));
        assert_eq!(
            messages(store.as_ref(), run.id).await,
            vec![
                "Step 1/3: build - started",
                "Step 1/3: build - completed",
                "Step 2/3: test - started",
                "ERROR: tests are red",
            ]
        );

        let stored = store.get_run(run.id).await.unwrap().unwrap();
        assert_eq!(stored, run);
    })
    .await;
}
