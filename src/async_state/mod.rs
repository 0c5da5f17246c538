//! Asynchronous operation state management.
//!
//! [`AsyncStateMachine`] models the lifecycle of the asynchronous operations a
//! consumer (for example a screen showing a project list) starts:
//!
//! ```text
//! Idle ──run──▶ Loading ──ok──▶ Success(data)
//!                  │    ──err─▶ Error(error)
//!                  ▲                 │
//!                  └──────run────────┘
//! ```
//!
//! # Design
//!
//! - **Explicit configuration**: each machine receives an [`AsyncConfig`] at
//!   construction instead of reading shared defaults.
//! - **Typed operations**: `run` accepts anything implementing
//!   [`IntoFuture`](std::future::IntoFuture) whose output is a `Result`.
//! - **Lifetime safety**: updates are applied through a
//!   [`SafeDispatcher`](crate::lifetime::SafeDispatcher); after teardown,
//!   late completions are discarded. The operation itself is not cancelled.
//! - **Observers**: [`AsyncStateMachine::subscribe`] registers a callback that
//!   is invoked synchronously with every applied state.
//! - **Overlapping runs**: completions are applied in completion order by
//!   default; [`StaleCompletions::Discard`] switches to "last started wins".
//!
//! # Examples
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use taskboard::async_state::{AsyncStateMachine, AsyncStatus, RetrySpec};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let machine: AsyncStateMachine<Vec<String>, String> = AsyncStateMachine::default();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let _subscription = {
//!     let seen = Arc::clone(&seen);
//!     machine.subscribe(move |state| seen.lock().unwrap().push(state.status()))
//! };
//!
//! let fetch = || async { Ok(vec!["alpha".to_string()]) };
//! machine.run(fetch(), Some(RetrySpec::new(fetch))).await.unwrap();
//! machine.retry().unwrap().await.unwrap();
//!
//! assert_eq!(
//!     *seen.lock().unwrap(),
//!     vec![
//!         AsyncStatus::Loading,
//!         AsyncStatus::Success,
//!         AsyncStatus::Loading,
//!         AsyncStatus::Success,
//!     ]
//! );
//! # }
//! ```

mod config;
mod machine;
mod observer;
mod outcome;
mod retry;
mod state;

pub use config::{AsyncConfig, StaleCompletions};
pub use machine::{AsyncStateMachine, Run};
pub use observer::Subscription;
pub use outcome::Settled;
pub use retry::{RetryHandle, RetrySpec, RunOutput};
pub use state::{AsyncState, AsyncStatus};
