//! Debounced calls.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A callable whose invocations are coalesced: only the last call within a
/// quiet period of `delay` reaches the target.
///
/// The target function and each call's arguments are captured explicitly;
/// nothing depends on an ambient receiver.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
/// use taskboard::debounce::debounce;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let calls = Arc::new(Mutex::new(Vec::new()));
/// let mut save = {
///     let calls = Arc::clone(&calls);
///     debounce(move |text: String| calls.lock().unwrap().push(text), Duration::from_millis(10))
/// };
///
/// save.call("d".to_string());
/// save.call("draft".to_string());
/// tokio::time::sleep(Duration::from_millis(30)).await;
///
/// assert_eq!(*calls.lock().unwrap(), vec!["draft".to_string()]);
/// # }
/// ```
pub struct DebouncedFn<A> {
    target: Arc<dyn Fn(A) + Send + Sync>,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    runtime: Handle,
}

/// Wraps `target` so that bursts of calls collapse into the last one.
///
/// # Panics
///
/// Panics when called outside of a Tokio runtime.
pub fn debounce<A, F>(target: F, delay: Duration) -> DebouncedFn<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    DebouncedFn::new(target, delay)
}

impl<A: Send + 'static> DebouncedFn<A> {
    /// Creates a debounced callable on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn new<F>(target: F, delay: Duration) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::with_handle(target, delay, Handle::current())
    }

    /// Creates a debounced callable whose timers run on `runtime`.
    pub fn with_handle<F>(target: F, delay: Duration, runtime: Handle) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            target: Arc::new(target),
            delay,
            pending: None,
            runtime,
        }
    }

    /// Schedules `target(args)` after the delay, replacing any pending call.
    pub fn call(&mut self, args: A) {
        self.cancel();
        let target = Arc::clone(&self.target);
        let delay = self.delay;
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            target(args);
        }));
    }

    /// The quiet period.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl<A> DebouncedFn<A> {
    /// Drops the pending call, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some_and(|pending| {
            let was_pending = !pending.is_finished();
            pending.abort();
            was_pending
        })
    }

    /// `true` while a call is scheduled and has not run yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|pending| !pending.is_finished())
    }
}

impl<A> Drop for DebouncedFn<A> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<A> fmt::Debug for DebouncedFn<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DebouncedFn")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rstest::rstest;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) + Send + Sync + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |value| sink.lock().push(value))
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn only_the_last_call_of_a_burst_runs() {
        let (calls, target) = recorder();
        let mut debounced = debounce(target, Duration::from_millis(50));

        for value in 1..=5 {
            debounced.call(value);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(*calls.lock(), vec![5]);
        assert!(!debounced.is_pending());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn separated_calls_all_run() {
        let (calls, target) = recorder();
        let mut debounced = debounce(target, Duration::from_millis(20));

        debounced.call(1);
        tokio::time::sleep(Duration::from_millis(30)).await;
        debounced.call(2);
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(*calls.lock(), vec![1, 2]);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_call() {
        let (calls, target) = recorder();
        let mut debounced = debounce(target, Duration::from_millis(20));

        debounced.call(1);
        assert!(debounced.is_pending());
        assert!(debounced.cancel());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(calls.lock().is_empty());
        assert!(!debounced.cancel());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn drop_cancels_the_pending_call() {
        let (calls, target) = recorder();
        let mut debounced = debounce(target, Duration::from_millis(20));

        debounced.call(7);
        drop(debounced);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(calls.lock().is_empty());
    }
}
