//! Replaying the last run.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;

use super::Settled;

/// What awaiting a run produces: the settled outcome, or the error itself when
/// [`AsyncConfig::throw_on_error`](super::AsyncConfig::throw_on_error) is set.
pub type RunOutput<D, E> = Result<Settled<D, E>, E>;

type OperationFactory<D, E> = dyn Fn() -> BoxFuture<'static, Result<D, E>> + Send + Sync;
type Replay<D, E> = dyn Fn() -> Option<BoxFuture<'static, RunOutput<D, E>>> + Send + Sync;

/// Describes how to re-create an operation for a retry.
///
/// The factory is called once per retry and must return a fresh operation,
/// typically re-issuing the same logical request.
///
/// # Examples
///
/// ```rust
/// use taskboard::async_state::RetrySpec;
///
/// let spec: RetrySpec<u32, String> = RetrySpec::new(|| async { Ok(1) });
/// # let _ = spec;
/// ```
pub struct RetrySpec<D, E> {
    factory: Arc<OperationFactory<D, E>>,
}

impl<D: 'static, E: 'static> RetrySpec<D, E> {
    /// Creates a retry spec from an operation factory.
    pub fn new<F, Fut>(retry: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<D, E>> + Send + 'static,
    {
        Self {
            factory: Arc::new(move || -> BoxFuture<'static, Result<D, E>> { Box::pin(retry()) }),
        }
    }

    /// Creates a fresh operation.
    pub(crate) fn operation(&self) -> BoxFuture<'static, Result<D, E>> {
        (self.factory)()
    }
}

impl<D, E> Clone for RetrySpec<D, E> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<D, E> fmt::Debug for RetrySpec<D, E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("RetrySpec").finish_non_exhaustive()
    }
}

/// Zero-argument action replaying the last run of a state machine.
///
/// Replaced on every run. A handle captured from a run without a
/// [`RetrySpec`], or taken before any run, is a no-op.
pub struct RetryHandle<D, E> {
    replay: Option<Arc<Replay<D, E>>>,
}

impl<D, E> RetryHandle<D, E> {
    /// A handle that does nothing when invoked.
    #[must_use]
    pub const fn noop() -> Self {
        Self { replay: None }
    }

    pub(crate) fn new<F>(replay: F) -> Self
    where
        F: Fn() -> Option<BoxFuture<'static, RunOutput<D, E>>> + Send + Sync + 'static,
    {
        Self {
            replay: Some(Arc::new(replay)),
        }
    }

    /// `true` if invoking this handle does nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.replay.is_none()
    }

    /// Replays the captured run.
    ///
    /// The state machine moves to `Loading` before this returns; the returned
    /// future drives the new operation. Returns `None` for a no-op handle or
    /// when the state machine no longer exists.
    #[must_use = "the retried operation only runs when the returned future is polled"]
    pub fn invoke(&self) -> Option<BoxFuture<'static, RunOutput<D, E>>> {
        self.replay.as_ref().and_then(|replay| replay())
    }

    /// Replays the captured run on the Tokio runtime.
    ///
    /// The replay settles the state machine even if the returned handle is
    /// dropped. Returns `None` when [`invoke`](Self::invoke) would.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn spawn(&self) -> Option<JoinHandle<RunOutput<D, E>>>
    where
        D: Send + 'static,
        E: Send + 'static,
    {
        self.invoke().map(tokio::spawn)
    }
}

impl<D, E> Clone for RetryHandle<D, E> {
    fn clone(&self) -> Self {
        Self {
            replay: self.replay.clone(),
        }
    }
}

impl<D, E> Default for RetryHandle<D, E> {
    fn default() -> Self {
        Self::noop()
    }
}

impl<D, E> fmt::Debug for RetryHandle<D, E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RetryHandle")
            .field("noop", &self.is_noop())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn noop_handle_returns_nothing() {
        let handle: RetryHandle<i32, String> = RetryHandle::noop();
        assert!(handle.is_noop());
        assert!(handle.invoke().is_none());
        assert!(RetryHandle::<i32, String>::default().is_noop());
    }

    #[rstest]
    #[tokio::test]
    async fn spec_creates_a_fresh_operation_each_time() {
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let spec: RetrySpec<usize, String> = {
            let counter = Arc::clone(&counter);
            RetrySpec::new(move || {
                let counter = Arc::clone(&counter);
                async move { Ok(counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1) }
            })
        };

        assert_eq!(spec.operation().await, Ok(1));
        assert_eq!(spec.clone().operation().await, Ok(2));
    }
}
