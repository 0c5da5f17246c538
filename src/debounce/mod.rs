//! Debouncing of values and calls.
//!
//! [`Debounced`] holds a *stabilized* copy of a value that may change
//! rapidly (for example the text of a search box). The stabilized copy only
//! follows the input after a full quiet period with no new input.
//! [`DebouncedFn`] applies the same idea to a callable.
//!
//! Both own at most one pending timer task on the Tokio runtime. A new input
//! aborts the pending timer before arming the next one, and dropping the
//! holder aborts it as well. A zero delay still goes through the runtime, so
//! the stabilized value never changes synchronously inside `observe`.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use taskboard::debounce::Debounced;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut search = Debounced::new(String::new());
//! let delay = Duration::from_millis(20);
//!
//! assert_eq!(search.observe("p".to_string(), delay), "");
//! assert_eq!(search.observe("pr".to_string(), delay), "");
//!
//! tokio::time::sleep(Duration::from_millis(50)).await;
//! assert_eq!(search.observe("pr".to_string(), delay), "pr");
//! # }
//! ```

mod function;

pub use function::{DebouncedFn, debounce};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A trailing, stabilized copy of a changing value.
///
/// Call [`observe`](Self::observe) with the latest input whenever it may have
/// changed; inputs are compared with `PartialEq`, so observing an unchanged
/// `(value, delay)` pair does not restart the quiet period.
pub struct Debounced<T> {
    stabilized: Arc<watch::Sender<T>>,
    last_input: Option<(T, Duration)>,
    pending: Option<JoinHandle<()>>,
    runtime: Handle,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates a holder whose stabilized value starts as `initial`.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime. Use
    /// [`with_handle`](Self::with_handle) to pass the runtime explicitly.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self::with_handle(initial, Handle::current())
    }

    /// Creates a holder whose timers run on `runtime`.
    #[must_use]
    pub fn with_handle(initial: T, runtime: Handle) -> Self {
        let (stabilized, _) = watch::channel(initial);
        Self {
            stabilized: Arc::new(stabilized),
            last_input: None,
            pending: None,
            runtime,
        }
    }

    /// Feeds the latest input and returns the current stabilized value.
    ///
    /// If `(value, delay)` differs from the previously observed pair, the
    /// pending timer (if any) is aborted and a new one is armed; when it fires
    /// without being replaced, the stabilized value becomes `value`.
    pub fn observe(&mut self, value: T, delay: Duration) -> T {
        let changed = self
            .last_input
            .as_ref()
            .is_none_or(|(last, last_delay)| *last != value || *last_delay != delay);
        if changed {
            self.arm(value.clone(), delay);
            self.last_input = Some((value, delay));
        }
        self.current()
    }

    /// Returns the current stabilized value.
    #[must_use]
    pub fn current(&self) -> T {
        self.stabilized.borrow().clone()
    }

    /// Returns a receiver notified whenever the stabilized value changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.stabilized.subscribe()
    }

    /// `true` while a timer is armed and has not fired yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|pending| !pending.is_finished())
    }

    fn arm(&mut self, value: T, delay: Duration) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        tracing::trace!(?delay, "arming debounce timer");

        let stabilized = Arc::clone(&self.stabilized);
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            stabilized.send_if_modified(|current| {
                if *current == value {
                    false
                } else {
                    *current = value;
                    true
                }
            });
        }));
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Debounced<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Debounced")
            .field("stabilized", &*self.stabilized.borrow())
            .field("last_input", &self.last_input)
            .finish_non_exhaustive()
    }
}
