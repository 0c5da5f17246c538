//! Lifetime-aware update dispatch.

use super::LifetimeFlag;

/// Wraps state-update functions so that updates arriving after teardown are
/// silently dropped.
///
/// Results of asynchronous work that outlives its consumer must not be
/// applied; the dispatcher turns such late updates into no-ops. Dropped
/// updates are reported at `trace` level only.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use taskboard::lifetime::{LifetimeGuard, SafeDispatcher};
///
/// let guard = LifetimeGuard::new();
/// let dispatcher = SafeDispatcher::new(guard.flag());
/// let total = AtomicUsize::new(0);
/// let add = dispatcher.wrap(|patch: usize| {
///     total.fetch_add(patch, Ordering::SeqCst);
/// });
///
/// add(2);
/// guard.teardown();
/// add(40);
///
/// assert_eq!(total.load(Ordering::SeqCst), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SafeDispatcher {
    lifetime: LifetimeFlag,
}

impl SafeDispatcher {
    /// Creates a dispatcher bound to the given consumer lifetime.
    #[must_use]
    pub const fn new(lifetime: LifetimeFlag) -> Self {
        Self { lifetime }
    }

    /// Returns `true` while updates are still being applied.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifetime.is_alive()
    }

    /// Wraps `update` so that it is only invoked while the consumer is alive.
    pub fn wrap<P, F>(&self, update: F) -> impl Fn(P) + use<P, F>
    where
        F: Fn(P),
    {
        let lifetime = self.lifetime.clone();
        move |patch| {
            if lifetime.is_alive() {
                update(patch);
            } else {
                tracing::trace!("dropping update dispatched after teardown");
            }
        }
    }

    /// Applies a single update if the consumer is alive.
    ///
    /// Returns whether the update was applied.
    pub fn dispatch<P, F>(&self, update: F, patch: P) -> bool
    where
        F: FnOnce(P),
    {
        if self.lifetime.is_alive() {
            update(patch);
            true
        } else {
            tracing::trace!("dropping update dispatched after teardown");
            false
        }
    }
}
