//! Per-instance configuration of an [`AsyncStateMachine`](super::AsyncStateMachine).

/// How completions of overlapping runs are applied.
///
/// Two runs started on the same machine both resolve independently. This
/// policy decides whether the earlier one may still write its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StaleCompletions {
    /// Every completion is applied in completion order: the last operation to
    /// finish wins, even if it was started first.
    #[default]
    Apply,
    /// Only the most recently started run may change the state; completions
    /// of superseded runs are still returned to their caller but leave the
    /// state untouched.
    Discard,
}

/// Configuration passed to each state machine at construction.
///
/// # Defaults
///
/// - `throw_on_error`: `false`
/// - `stale_completions`: [`StaleCompletions::Apply`]
///
/// # Examples
///
/// ```rust
/// use taskboard::async_state::{AsyncConfig, StaleCompletions};
///
/// let config = AsyncConfig::default()
///     .with_throw_on_error(true)
///     .with_stale_completions(StaleCompletions::Discard);
/// assert!(config.throw_on_error);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AsyncConfig {
    /// When `true`, a failed run resolves to `Err(error)` after the state has
    /// been updated. When `false`, the error is returned as
    /// [`Settled::Failure`](super::Settled::Failure).
    pub throw_on_error: bool,
    /// Policy for overlapping runs.
    pub stale_completions: StaleCompletions,
}

impl AsyncConfig {
    /// Returns a copy with `throw_on_error` set.
    #[must_use]
    pub const fn with_throw_on_error(mut self, throw_on_error: bool) -> Self {
        self.throw_on_error = throw_on_error;
        self
    }

    /// Returns a copy with the given overlapping-run policy.
    #[must_use]
    pub const fn with_stale_completions(mut self, stale_completions: StaleCompletions) -> Self {
        self.stale_completions = stale_completions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_absorb_errors_and_apply_all_completions() {
        let config = AsyncConfig::default();
        assert!(!config.throw_on_error);
        assert_eq!(config.stale_completions, StaleCompletions::Apply);
    }

    #[rstest]
    fn builders_override_fields() {
        let config = AsyncConfig::default()
            .with_throw_on_error(true)
            .with_stale_completions(StaleCompletions::Discard);

        assert_eq!(
            config,
            AsyncConfig {
                throw_on_error: true,
                stale_completions: StaleCompletions::Discard,
            }
        );
    }
}
