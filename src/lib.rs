//! # taskboard
//!
//! Client-side plumbing for a project management front end: an asynchronous
//! operation state machine, value debouncing, lifetime-safe dispatch and a
//! small REST layer for projects and users.
//!
//! ## Overview
//!
//! - **Lifetime**: [`lifetime::LifetimeGuard`] tracks whether a consumer is
//!   still alive; [`lifetime::SafeDispatcher`] drops updates after teardown.
//! - **Debounce**: [`debounce::Debounced`] produces a trailing, stabilized
//!   copy of a rapidly changing value; [`debounce::DebouncedFn`] debounces a
//!   callable.
//! - **Async state**: [`async_state::AsyncStateMachine`] models one
//!   asynchronous operation (idle, loading, success, error) with retry and
//!   observers.
//! - **Client** (feature `client`): the REST client, authentication, URL
//!   query-string synchronization and the project list controller.
//!
//! ## Feature Flags
//!
//! - `client` (default): `http`, `auth`, `query` and `project` modules
//!
//! ## Example
//!
//! ```rust
//! use taskboard::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let machine: AsyncStateMachine<u32, String> = AsyncStateMachine::default();
//! let run = machine.run(async { Ok::<_, String>(42) }, None);
//! assert!(machine.is_loading());
//!
//! assert_eq!(run.await, Ok(Settled::Success(42)));
//! assert_eq!(machine.data(), Some(42));
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use taskboard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::async_state::*;
    pub use crate::debounce::*;
    pub use crate::lifetime::*;

    #[cfg(feature = "client")]
    pub use crate::auth::*;

    #[cfg(feature = "client")]
    pub use crate::http::*;

    #[cfg(feature = "client")]
    pub use crate::project::*;

    #[cfg(feature = "client")]
    pub use crate::query::*;
}

pub mod async_state;
pub mod debounce;
pub mod lifetime;

#[cfg(feature = "client")]
pub mod auth;

#[cfg(feature = "client")]
pub mod http;

#[cfg(feature = "client")]
pub mod project;

#[cfg(feature = "client")]
pub mod query;
