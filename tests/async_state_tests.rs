//! Async state machine behaviour tests.
//!
//! Covers the lifecycle contract: synchronous `Loading`, mutually exclusive
//! data and error, teardown fencing, retry replay, error propagation modes
//! and the handling of overlapping runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rstest::rstest;
use taskboard::async_state::{
    AsyncConfig, AsyncState, AsyncStateMachine, AsyncStatus, RetrySpec, Settled, StaleCompletions,
};
use tokio::sync::{mpsc, oneshot};

type Machine = AsyncStateMachine<u32, String>;

fn recorder(machine: &Machine) -> (Arc<Mutex<Vec<AsyncStatus>>>, taskboard::async_state::Subscription) {
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&statuses);
    let subscription = machine.subscribe(move |state: &AsyncState<u32, String>| sink.lock().push(state.status()));
    (statuses, subscription)
}

async fn pending_until(receiver: oneshot::Receiver<Result<u32, String>>) -> Result<u32, String> {
    receiver.await.unwrap_or_else(|_| Err("sender dropped".to_string()))
}

// =============================================================================
// Loading is entered synchronously
// =============================================================================

/// `run` moves to `Loading` before the operation is ever polled.
#[rstest]
#[tokio::test]
async fn test_run_enters_loading_before_first_poll() {
    let machine = Machine::default();
    let (_sender, receiver) = oneshot::channel();

    let run = machine.run(pending_until(receiver), None);

    assert!(machine.is_loading());
    assert_eq!(machine.data(), None);
    drop(run);
}

/// Every run, including ones following a settled run, starts in `Loading`.
#[rstest]
#[tokio::test]
async fn test_every_run_reenters_loading() {
    let machine = Machine::default();
    let (statuses, _subscription) = recorder(&machine);

    let _ = machine.run(async { Ok(1) }, None).await;
    let _ = machine.run(async { Err("x".to_string()) }, None).await;
    let _ = machine.run(async { Ok(2) }, None).await;

    assert_eq!(
        *statuses.lock(),
        vec![
            AsyncStatus::Loading,
            AsyncStatus::Success,
            AsyncStatus::Loading,
            AsyncStatus::Error,
            AsyncStatus::Loading,
            AsyncStatus::Success,
        ]
    );
}

// =============================================================================
// Data and error are mutually exclusive
// =============================================================================

/// Success sets data and clears a previous error.
#[rstest]
#[tokio::test]
async fn test_success_clears_error() {
    let machine = Machine::default();
    machine.set_error("old".to_string());

    let outcome = machine.run(async { Ok(5) }, None).await;

    assert_eq!(outcome, Ok(Settled::Success(5)));
    assert_eq!(machine.data(), Some(5));
    assert_eq!(machine.error(), None);
}

/// Failure sets the error and clears previous data.
#[rstest]
#[tokio::test]
async fn test_failure_clears_data() {
    let machine = Machine::default();
    machine.set_data(3);

    let _ = machine.run(async { Err("boom".to_string()) }, None).await;

    assert_eq!(machine.data(), None);
    assert_eq!(machine.error().as_deref(), Some("boom"));
}

/// Setting the same data twice is the same as setting it once.
#[rstest]
fn test_set_data_is_idempotent() {
    let once = Machine::default();
    once.set_data(9);

    let twice = Machine::default();
    twice.set_data(9);
    twice.set_data(9);

    assert_eq!(once.state(), twice.state());
    assert_eq!(twice.state(), AsyncState::Success(9));
}

// =============================================================================
// Teardown
// =============================================================================

/// A completion arriving after teardown leaves the state untouched.
#[rstest]
#[tokio::test]
async fn test_completion_after_teardown_is_discarded() {
    let machine = Machine::default();
    let (sender, receiver) = oneshot::channel();

    let handle = machine.spawn_run(pending_until(receiver), None);
    let snapshot = machine.state();
    machine.teardown();
    sender.send(Ok(1)).unwrap();

    let outcome = handle.await.unwrap();

    assert_eq!(outcome, Ok(Settled::Success(1)));
    assert_eq!(machine.state(), snapshot);
    assert_eq!(snapshot, AsyncState::Loading);
}

/// Direct setters and new runs are ignored after teardown.
#[rstest]
#[tokio::test]
async fn test_setters_after_teardown_are_ignored() {
    let machine = Machine::default();
    machine.set_data(1);
    let (statuses, _subscription) = recorder(&machine);
    machine.teardown();

    machine.set_data(2);
    machine.set_error("late".to_string());
    let _ = machine.run(async { Ok(3) }, None).await;

    assert_eq!(machine.state(), AsyncState::Success(1));
    assert!(statuses.lock().is_empty());
}

/// Dropping the machine disables its retry handle.
#[rstest]
#[tokio::test]
async fn test_retry_handle_outliving_the_machine_is_inert() {
    let machine = Machine::default();
    let _ = machine
        .run(async { Err("x".to_string()) }, Some(RetrySpec::new(|| async { Ok(1) })))
        .await;
    let handle = machine.retry_handle();
    assert!(!handle.is_noop());

    drop(machine);

    assert!(handle.invoke().is_none());
}

// =============================================================================
// Retry
// =============================================================================

/// Retrying a failed run calls the retry factory exactly once and goes
/// through the same transitions as a fresh run.
#[rstest]
#[tokio::test]
async fn test_retry_replays_the_operation_once() {
    let machine = Machine::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let spec = RetrySpec::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(7) }
    });

    let first = machine.run(async { Err("offline".to_string()) }, Some(spec)).await;
    assert_eq!(first, Ok(Settled::Failure("offline".to_string())));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let (statuses, _subscription) = recorder(&machine);
    let retried = machine.retry().expect("retry spec was supplied").await;

    assert_eq!(retried, Ok(Settled::Success(7)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*statuses.lock(), vec![AsyncStatus::Loading, AsyncStatus::Success]);
}

/// A background retry settles the state without anyone awaiting it.
#[rstest]
#[tokio::test]
async fn test_spawned_retry_settles_without_being_awaited() {
    let machine = Machine::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let spec = RetrySpec::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(7) }
    });
    let _ = machine.run(async { Err("offline".to_string()) }, Some(spec)).await;

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let _subscription = machine.subscribe(move |state: &AsyncState<u32, String>| {
        let _ = sender.send(state.status());
    });
    drop(machine.spawn_retry().expect("retry spec was supplied"));

    assert_eq!(receiver.recv().await, Some(AsyncStatus::Loading));
    assert_eq!(receiver.recv().await, Some(AsyncStatus::Success));
    assert_eq!(machine.data(), Some(7));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// A cloned retry handle can be fired and forgotten.
#[rstest]
#[tokio::test]
async fn test_retry_handle_spawn_replays_the_run() {
    let machine = Machine::default();
    let _ = machine
        .run(async { Err("x".to_string()) }, Some(RetrySpec::new(|| async { Ok(3) })))
        .await;
    let handle = machine.retry_handle();

    let outcome = handle.spawn().expect("retry spec was supplied").await.unwrap();

    assert_eq!(outcome, Ok(Settled::Success(3)));
    assert_eq!(machine.data(), Some(3));

    drop(machine);
    assert!(handle.spawn().is_none());
}

/// A run without a retry spec replaces the previous handle with a no-op.
#[rstest]
#[tokio::test]
async fn test_run_without_spec_clears_retry() {
    let machine = Machine::default();
    let _ = machine
        .run(async { Ok(1) }, Some(RetrySpec::new(|| async { Ok(2) })))
        .await;
    assert!(machine.retry().is_some());

    let _ = machine.run(async { Ok(3) }, None).await;

    assert!(machine.retry().is_none());
    assert!(machine.retry_handle().is_noop());
}

// =============================================================================
// Error propagation
// =============================================================================

/// By default a failed operation resolves with the error as a value.
#[rstest]
#[tokio::test]
async fn test_errors_are_absorbed_by_default() {
    let machine = Machine::default();

    let outcome = machine.run(async { Err("x".to_string()) }, None).await;

    assert_eq!(outcome, Ok(Settled::Failure("x".to_string())));
    assert!(machine.is_error());
    assert_eq!(machine.error().as_deref(), Some("x"));
}

/// With `throw_on_error` the run fails, after the state has settled.
#[rstest]
#[tokio::test]
async fn test_throw_on_error_propagates_after_settling() {
    let machine = Machine::new(AsyncConfig::default().with_throw_on_error(true));
    let (statuses, _subscription) = recorder(&machine);

    let outcome = machine.run(async { Err("x".to_string()) }, None).await;

    assert_eq!(outcome, Err("x".to_string()));
    assert!(machine.is_error());
    assert_eq!(*statuses.lock(), vec![AsyncStatus::Loading, AsyncStatus::Error]);
}

/// Successful runs are unaffected by `throw_on_error`.
#[rstest]
#[case(false)]
#[case(true)]
#[tokio::test]
async fn test_success_ignores_throw_on_error(#[case] throw_on_error: bool) {
    let machine = Machine::new(AsyncConfig::default().with_throw_on_error(throw_on_error));

    assert_eq!(machine.run(async { Ok(4) }, None).await, Ok(Settled::Success(4)));
}

// =============================================================================
// Overlapping runs
// =============================================================================

async fn overlapping(policy: StaleCompletions) -> (Machine, Settled<u32, String>) {
    let machine = Machine::new(AsyncConfig::default().with_stale_completions(policy));
    let (first_sender, first_receiver) = oneshot::channel();
    let (second_sender, second_receiver) = oneshot::channel();

    let first = machine.spawn_run(pending_until(first_receiver), None);
    let second = machine.spawn_run(pending_until(second_receiver), None);

    second_sender.send(Ok(2)).unwrap();
    assert_eq!(second.await.unwrap(), Ok(Settled::Success(2)));
    first_sender.send(Ok(1)).unwrap();
    let first_outcome = first.await.unwrap().unwrap();

    (machine, first_outcome)
}

/// By default the run that finishes last wins.
#[rstest]
#[tokio::test]
async fn test_last_to_finish_wins_by_default() {
    let (machine, first_outcome) = overlapping(StaleCompletions::default()).await;

    assert_eq!(first_outcome, Settled::Success(1));
    assert_eq!(machine.data(), Some(1));
}

/// With `Discard` the run that started last wins; the stale caller still
/// receives its own result.
#[rstest]
#[tokio::test]
async fn test_discard_keeps_the_latest_run() {
    let (machine, first_outcome) = overlapping(StaleCompletions::Discard).await;

    assert_eq!(first_outcome, Settled::Success(1));
    assert_eq!(machine.data(), Some(2));
}

// =============================================================================
// Observers
// =============================================================================

/// Unsubscribed observers are no longer called.
#[rstest]
fn test_unsubscribe_stops_notifications() {
    let machine = Machine::default();
    let (statuses, subscription) = recorder(&machine);

    machine.set_data(1);
    subscription.unsubscribe();
    machine.set_data(2);

    assert_eq!(*statuses.lock(), vec![AsyncStatus::Success]);
}

/// A detached subscription stays active for the machine's lifetime.
#[rstest]
fn test_detached_observer_keeps_listening() {
    let machine = Machine::default();
    let (statuses, subscription) = recorder(&machine);

    subscription.detach();
    machine.set_data(1);
    machine.set_error("x".to_string());

    assert_eq!(*statuses.lock(), vec![AsyncStatus::Success, AsyncStatus::Error]);
}

/// A machine can start from a caller-provided state.
#[rstest]
fn test_initial_state_is_respected() {
    let machine = Machine::with_initial_state(AsyncState::Success(10), AsyncConfig::default());

    assert!(machine.is_success());
    assert_eq!(machine.data(), Some(10));
    assert!(!machine.is_idle());
}
