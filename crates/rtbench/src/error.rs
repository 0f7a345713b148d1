//! Error types for rtbench

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid {name}: {value} (must be a positive, finite number)")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("Sample rate {sample_hz} Hz exceeds action rate {action_hz} Hz")]
    SampleRateAboveActionRate { sample_hz: f64, action_hz: f64 },

    #[error("Invalid duration factor: {0} (must be finite and at least 0)")]
    InvalidDurationFactor(f64),

    #[error("Invalid duration: {0}s (must be a positive, finite number of seconds)")]
    InvalidDuration(f64),

    #[error("Timer error: {0}")]
    Timer(#[from] rt_timer::TimerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Whether the error came from bad command-line input.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            CliError::InvalidRate { .. }
                | CliError::SampleRateAboveActionRate { .. }
                | CliError::InvalidDurationFactor(_)
                | CliError::InvalidDuration(_)
        )
    }
}
