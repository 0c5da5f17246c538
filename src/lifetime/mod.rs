//! Consumer lifetime tracking.
//!
//! A *consumer* (for example a screen controller) owns exactly one
//! [`LifetimeGuard`]. Asynchronous work started by the consumer may finish
//! after the consumer has been torn down; such work consults a
//! [`LifetimeFlag`] (or goes through a [`SafeDispatcher`]) so that its
//! results are discarded instead of mutating state that nobody owns anymore.
//!
//! The flag is write-once: it starts out alive and flips to torn down exactly
//! once. Reading it never has side effects.
//!
//! # Examples
//!
//! ```rust
//! use taskboard::lifetime::LifetimeGuard;
//!
//! let guard = LifetimeGuard::new();
//! let flag = guard.flag();
//! assert!(flag.is_alive());
//!
//! drop(guard);
//! assert!(!flag.is_alive());
//! ```

mod dispatch;

pub use dispatch::SafeDispatcher;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Owner side of a consumer's lifetime.
///
/// The guard is not `Clone`; dropping it is the teardown point. Readers
/// obtain a [`LifetimeFlag`] via [`LifetimeGuard::flag`].
#[derive(Debug)]
pub struct LifetimeGuard {
    alive: Arc<AtomicBool>,
}

impl LifetimeGuard {
    /// Creates a guard for a freshly constructed consumer (alive).
    #[must_use]
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns a read-only view of this guard's liveness.
    #[must_use]
    pub fn flag(&self) -> LifetimeFlag {
        LifetimeFlag {
            alive: Arc::clone(&self.alive),
        }
    }

    /// Returns `true` until [`teardown`](Self::teardown) has been called.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Marks the consumer as torn down.
    ///
    /// Idempotent and safe to call re-entrantly. Returns `true` only for the
    /// call that actually performed the transition.
    pub fn teardown(&self) -> bool {
        let flipped = self.alive.swap(false, Ordering::AcqRel);
        if flipped {
            tracing::debug!("consumer torn down");
        }
        flipped
    }
}

impl Default for LifetimeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LifetimeGuard {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Shared, read-only liveness cell handed out by a [`LifetimeGuard`].
///
/// Monotonic: once it reports `false` it never reports `true` again.
#[derive(Debug, Clone)]
pub struct LifetimeFlag {
    alive: Arc<AtomicBool>,
}

impl LifetimeFlag {
    /// Returns `true` while the owning consumer has not been torn down.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}
