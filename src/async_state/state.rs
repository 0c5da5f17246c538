//! The state of a single asynchronous operation.

use std::fmt;

/// Discriminant of an [`AsyncState`].
///
/// The four statuses are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AsyncStatus {
    /// No operation has been started yet.
    #[default]
    Idle,
    /// An operation is in flight.
    Loading,
    /// The last operation produced data.
    Success,
    /// The last operation failed.
    Error,
}

impl fmt::Display for AsyncStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        };
        formatter.write_str(name)
    }
}

/// Lifecycle of one asynchronous operation.
///
/// Data is only ever present in [`AsyncState::Success`] and an error only in
/// [`AsyncState::Error`], so "data and error at the same time" cannot be
/// represented. Moving to `Loading` or `Error` drops previous data.
///
/// # Examples
///
/// ```rust
/// use taskboard::async_state::{AsyncState, AsyncStatus};
///
/// let state: AsyncState<u32, String> = AsyncState::Success(7);
/// assert_eq!(state.status(), AsyncStatus::Success);
/// assert_eq!(state.data(), Some(&7));
/// assert_eq!(state.error(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AsyncState<D, E> {
    /// Initial state.
    #[default]
    Idle,
    /// An operation is in flight; no data or error is retained.
    Loading,
    /// The operation resolved with data.
    Success(D),
    /// The operation failed.
    Error(E),
}

impl<D, E> AsyncState<D, E> {
    /// Returns the status discriminant.
    #[must_use]
    pub const fn status(&self) -> AsyncStatus {
        match self {
            Self::Idle => AsyncStatus::Idle,
            Self::Loading => AsyncStatus::Loading,
            Self::Success(_) => AsyncStatus::Success,
            Self::Error(_) => AsyncStatus::Error,
        }
    }

    /// Returns the data if the state is `Success`.
    #[must_use]
    pub const fn data(&self) -> Option<&D> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the error if the state is `Error`.
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Consumes the state and returns its data, if any.
    #[must_use]
    pub fn into_data(self) -> Option<D> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    /// `true` when the status is `Idle`.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// `true` when the status is `Loading`.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// `true` when the status is `Success`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// `true` when the status is `Error`.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
