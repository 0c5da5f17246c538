//! What a finished run hands back to its caller.

/// Outcome of a settled run when errors are absorbed.
///
/// With the default configuration a failed operation does not make the run
/// fail; the error is returned as `Failure` so the caller can branch on it
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<D, E> {
    /// The operation resolved with data.
    Success(D),
    /// The operation failed and the error was absorbed into state.
    Failure(E),
}

impl<D, E> Settled<D, E> {
    /// `true` for [`Settled::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// `true` for [`Settled::Failure`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Converts into a plain `Result`.
    ///
    /// # Errors
    ///
    /// Returns the absorbed error for [`Settled::Failure`].
    pub fn into_result(self) -> Result<D, E> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(error) => Err(error),
        }
    }
}

impl<D, E> From<Result<D, E>> for Settled<D, E> {
    fn from(result: Result<D, E>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(error) => Self::Failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn success_round_trips_through_result() {
        let settled: Settled<i32, String> = Ok(3).into();
        assert!(settled.is_success());
        assert_eq!(settled.into_result(), Ok(3));
    }

    #[rstest]
    fn failure_keeps_the_error() {
        let settled: Settled<i32, String> = Settled::Failure("x".to_string());
        assert!(settled.is_failure());
        assert_eq!(settled.into_result(), Err("x".to_string()));
    }
}
