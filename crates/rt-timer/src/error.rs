//! Error types for the timer crate.

use thiserror::Error;

/// Reason a timer period was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PeriodError {
    /// The period is zero, or rounds down to zero nanoseconds.
    #[error("period must be at least one nanosecond")]
    Zero,
    /// The period (or rate) is NaN or infinite.
    #[error("period must be a finite number")]
    NonFinite,
    /// The period (or rate) is negative or zero.
    #[error("period must be positive")]
    NonPositive,
    /// The period does not fit into 64 bits of nanoseconds.
    #[error("period exceeds the representable range of u64 nanoseconds")]
    OutOfRange,
}

/// Errors reported by timer construction and the execution wrapper.
///
/// None of these are produced on the poll path; polling and sampling are
/// infallible.
#[derive(Debug, Error)]
pub enum TimerError {
    /// Construction was attempted with an invalid period.
    #[error("invalid timer period: {0}")]
    InvalidPeriod(#[from] PeriodError),

    /// The OS refused to spawn the polling thread.
    #[error("failed to spawn timer thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The action panicked on the polling thread; the timer was lost with it.
    #[error("timer action panicked on the polling thread")]
    ActionPanicked,

    /// The wrapper no longer owns a timer after an earlier failure.
    #[error("timer thread is faulted and can no longer be started")]
    Faulted,
}

impl TimerError {
    /// Whether the wrapper can still be started after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TimerError::InvalidPeriod(_))
    }
}

/// Result alias used throughout the crate.
pub type TimerResult<T = ()> = Result<T, TimerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_error_converts() {
        let err: TimerError = PeriodError::NonPositive.into();
        assert!(matches!(err, TimerError::InvalidPeriod(PeriodError::NonPositive)));
        assert_eq!(err.to_string(), "invalid timer period: period must be positive");
    }

    #[test]
    fn test_recoverability() {
        assert!(TimerError::InvalidPeriod(PeriodError::Zero).is_recoverable());
        assert!(!TimerError::ActionPanicked.is_recoverable());
        assert!(!TimerError::Faulted.is_recoverable());
    }
}
