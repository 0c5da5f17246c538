//! The asynchronous operation state machine.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll, ready};

use futures::future::BoxFuture;
use parking_lot::{Mutex, ReentrantMutex};
use pin_project_lite::pin_project;
use tokio::task::JoinHandle;

use super::observer::{ObserverSet, Subscription};
use super::retry::{RetryHandle, RetrySpec, RunOutput};
use super::{AsyncConfig, AsyncState, AsyncStatus, Settled, StaleCompletions};
use crate::lifetime::{LifetimeFlag, LifetimeGuard, SafeDispatcher};

// =============================================================================
// Shared state
// =============================================================================

/// State reachable from in-flight runs and retry handles.
pub(crate) struct Shared<D, E> {
    state: Mutex<AsyncState<D, E>>,
    retry: Mutex<RetryHandle<D, E>>,
    observers: ObserverSet<AsyncState<D, E>>,
    // Held across a write and its notification so observers see states in
    // write order. Re-entrant for observers that transition the machine.
    delivery: ReentrantMutex<()>,
    dispatcher: SafeDispatcher,
    config: AsyncConfig,
    latest_request: AtomicU64,
}

impl<D, E> Shared<D, E>
where
    D: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn transition(&self, next: AsyncState<D, E>) {
        self.dispatcher.dispatch(
            |next: AsyncState<D, E>| {
                let _delivery = self.delivery.lock();
                let snapshot = {
                    let mut state = self.state.lock();
                    *state = next;
                    state.clone()
                };
                tracing::debug!(status = %snapshot.status(), "async state transition");
                self.observers.notify(&snapshot);
            },
            next,
        );
    }

    fn run<F>(self: &Arc<Self>, operation: F, retry: Option<RetrySpec<D, E>>) -> Run<F::IntoFuture, D, E>
    where
        F: IntoFuture<Output = Result<D, E>>,
    {
        let request = self.latest_request.fetch_add(1, Ordering::AcqRel) + 1;
        let handle = retry.map_or_else(RetryHandle::noop, |spec| replay_handle(self, spec));
        *self.retry.lock() = handle;

        tracing::debug!(request, "run started");
        self.transition(AsyncState::Loading);

        Run {
            operation: operation.into_future(),
            shared: Arc::clone(self),
            request,
        }
    }

    fn settle(&self, request: u64, result: Result<D, E>) -> RunOutput<D, E> {
        let current = match self.config.stale_completions {
            StaleCompletions::Apply => true,
            StaleCompletions::Discard => self.latest_request.load(Ordering::Acquire) == request,
        };
        if !current {
            tracing::debug!(request, "discarding completion of a superseded run");
        }

        match result {
            Ok(data) => {
                if current {
                    self.transition(AsyncState::Success(data.clone()));
                }
                Ok(Settled::Success(data))
            }
            Err(error) => {
                if current {
                    self.transition(AsyncState::Error(error.clone()));
                }
                if self.config.throw_on_error {
                    Err(error)
                } else {
                    Ok(Settled::Failure(error))
                }
            }
        }
    }
}

fn replay_handle<D, E>(shared: &Arc<Shared<D, E>>, spec: RetrySpec<D, E>) -> RetryHandle<D, E>
where
    D: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let shared = Arc::downgrade(shared);
    RetryHandle::new(move || {
        let shared = shared.upgrade()?;
        tracing::debug!("retrying last run");
        let run = shared.run(spec.operation(), Some(spec.clone()));
        Some(Box::pin(run) as BoxFuture<'static, RunOutput<D, E>>)
    })
}

// =============================================================================
// Run future
// =============================================================================

pin_project! {
    /// Future returned by [`AsyncStateMachine::run`].
    ///
    /// Drives the supplied operation and applies its result to the state
    /// machine (unless the consumer has been torn down in the meantime).
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct Run<Fut, D, E> {
        #[pin]
        operation: Fut,
        shared: Arc<Shared<D, E>>,
        request: u64,
    }
}

impl<Fut, D, E> Future for Run<Fut, D, E>
where
    Fut: Future<Output = Result<D, E>>,
    D: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = RunOutput<D, E>;

    fn poll(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = ready!(this.operation.poll(context));
        tracing::debug!(request = *this.request, ok = result.is_ok(), "run settled");
        Poll::Ready(this.shared.settle(*this.request, result))
    }
}

// =============================================================================
// AsyncStateMachine
// =============================================================================

/// Tracks the lifecycle of asynchronous operations for one consumer.
///
/// `Idle → Loading → Success | Error`, and back to `Loading` on every new
/// run. There is no terminal state.
///
/// Every state change goes through a [`SafeDispatcher`] bound to the
/// machine's own [`LifetimeGuard`]: once the machine is torn down (explicitly
/// via [`teardown`](Self::teardown) or by dropping it), results of runs that
/// are still in flight are discarded.
///
/// # Examples
///
/// ```rust
/// use taskboard::async_state::{AsyncStateMachine, AsyncConfig, Settled};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let machine: AsyncStateMachine<u32, String> = AsyncStateMachine::new(AsyncConfig::default());
///
/// let outcome = machine.run(async { Err::<u32, _>("x".to_string()) }, None).await;
///
/// assert_eq!(outcome, Ok(Settled::Failure("x".to_string())));
/// assert!(machine.is_error());
/// # }
/// ```
pub struct AsyncStateMachine<D, E> {
    shared: Arc<Shared<D, E>>,
    guard: LifetimeGuard,
}

impl<D, E> AsyncStateMachine<D, E>
where
    D: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates an idle state machine.
    #[must_use]
    pub fn new(config: AsyncConfig) -> Self {
        Self::with_initial_state(AsyncState::Idle, config)
    }

    /// Creates a state machine starting from `initial`.
    #[must_use]
    pub fn with_initial_state(initial: AsyncState<D, E>, config: AsyncConfig) -> Self {
        let guard = LifetimeGuard::new();
        let shared = Arc::new(Shared {
            state: Mutex::new(initial),
            retry: Mutex::new(RetryHandle::noop()),
            observers: ObserverSet::new(),
            delivery: ReentrantMutex::new(()),
            dispatcher: SafeDispatcher::new(guard.flag()),
            config,
            latest_request: AtomicU64::new(0),
        });
        Self { shared, guard }
    }

    /// Starts tracking `operation`.
    ///
    /// Before returning, the state moves to `Loading` and the retry handle is
    /// replaced (a no-op when `retry` is `None`). The returned future drives
    /// the operation; awaiting it yields:
    ///
    /// - `Ok(Settled::Success(data))` after the state became `Success(data)`,
    /// - `Ok(Settled::Failure(error))` after the state became `Error(error)`,
    ///   or `Err(error)` instead when `throw_on_error` is configured.
    ///
    /// Only futures are accepted, so handing over a plain value is rejected
    /// at compile time.
    pub fn run<F>(&self, operation: F, retry: Option<RetrySpec<D, E>>) -> Run<F::IntoFuture, D, E>
    where
        F: IntoFuture<Output = Result<D, E>>,
    {
        self.shared.run(operation, retry)
    }

    /// Like [`run`](Self::run), but drives the operation on the Tokio runtime
    /// so it completes even if nobody awaits the handle.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn spawn_run<F>(&self, operation: F, retry: Option<RetrySpec<D, E>>) -> JoinHandle<RunOutput<D, E>>
    where
        F: IntoFuture<Output = Result<D, E>>,
        F::IntoFuture: Send + 'static,
    {
        tokio::spawn(self.run(operation, retry))
    }

    /// Moves directly to `Success(data)`, bypassing [`run`](Self::run).
    pub fn set_data(&self, data: D) {
        self.shared.transition(AsyncState::Success(data));
    }

    /// Moves directly to `Error(error)`, bypassing [`run`](Self::run).
    pub fn set_error(&self, error: E) {
        self.shared.transition(AsyncState::Error(error));
    }

    /// Replays the last run through its [`RetrySpec`].
    ///
    /// Returns `None` if the last run had no retry spec.
    #[must_use = "the retried operation only runs when the returned future is polled"]
    pub fn retry(&self) -> Option<BoxFuture<'static, RunOutput<D, E>>> {
        self.retry_handle().invoke()
    }

    /// Like [`retry`](Self::retry), but drives the replay on the Tokio
    /// runtime so the state settles even if nobody awaits the handle.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn spawn_retry(&self) -> Option<JoinHandle<RunOutput<D, E>>> {
        self.retry_handle().spawn()
    }

    /// Returns the retry handle captured by the most recent run.
    #[must_use]
    pub fn retry_handle(&self) -> RetryHandle<D, E> {
        self.shared.retry.lock().clone()
    }

    /// Registers an observer called synchronously with every applied state.
    ///
    /// Notifications are delivered in the order the states were written, also
    /// when transitions race on several threads.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&AsyncState<D, E>) + Send + Sync + 'static,
    {
        self.shared.observers.subscribe(observer)
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AsyncState<D, E> {
        self.shared.state.lock().clone()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> AsyncStatus {
        self.shared.state.lock().status()
    }

    /// Returns the current data, if the state is `Success`.
    #[must_use]
    pub fn data(&self) -> Option<D> {
        self.shared.state.lock().data().cloned()
    }

    /// Returns the current error, if the state is `Error`.
    #[must_use]
    pub fn error(&self) -> Option<E> {
        self.shared.state.lock().error().cloned()
    }

    /// `true` when the status is `Idle`.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.status() == AsyncStatus::Idle
    }

    /// `true` when the status is `Loading`.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status() == AsyncStatus::Loading
    }

    /// `true` when the status is `Success`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status() == AsyncStatus::Success
    }

    /// `true` when the status is `Error`.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status() == AsyncStatus::Error
    }

    /// The configuration this machine was created with.
    #[must_use]
    pub fn config(&self) -> AsyncConfig {
        self.shared.config
    }
}

impl<D, E> AsyncStateMachine<D, E> {
    /// Tears the consumer down; no further state change is applied.
    ///
    /// Idempotent. Dropping the machine has the same effect.
    pub fn teardown(&self) {
        self.guard.teardown();
    }

    /// Returns the machine's liveness flag.
    #[must_use]
    pub fn lifetime(&self) -> LifetimeFlag {
        self.guard.flag()
    }
}

impl<D, E> Default for AsyncStateMachine<D, E>
where
    D: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(AsyncConfig::default())
    }
}

impl<D, E> fmt::Debug for AsyncStateMachine<D, E>
where
    D: fmt::Debug,
    E: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AsyncStateMachine")
            .field("state", &*self.shared.state.lock())
            .field("alive", &self.guard.is_alive())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}
