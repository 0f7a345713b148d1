//! Best-effort process priority elevation.
//!
//! Timing-sensitive benchmarks run better when the OS scheduler favors
//! their process. This crate asks for that once at startup. It is kept out
//! of `rt-timer` so the timer itself never touches OS scheduling state.
//!
//! # Example
//!
//! ```no_run
//! use rt_timer_priority::{PriorityLevel, elevate_best_effort};
//!
//! if !elevate_best_effort(PriorityLevel::Realtime) {
//!     eprintln!("running at normal priority; expect more jitter");
//! }
//! ```

#![deny(static_mut_refs)]

pub mod error;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use self::unix as platform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use self::windows as platform;

#[cfg(not(any(unix, windows)))]
mod fallback;
#[cfg(not(any(unix, windows)))]
use self::fallback as platform;

pub use error::{PriorityError, PriorityResult};

use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Requested scheduling priority for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PriorityLevel {
    /// Leave priority at the OS default.
    #[default]
    Normal,
    /// Elevated, but below real-time.
    High,
    /// Highest class the OS offers to normal processes.
    Realtime,
}

impl PriorityLevel {
    /// Lowercase name, as accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            PriorityLevel::Normal => "normal",
            PriorityLevel::High => "high",
            PriorityLevel::Realtime => "realtime",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`PriorityLevel`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority level '{0}' (expected normal, high or realtime)")]
pub struct ParsePriorityLevelError(String);

impl FromStr for PriorityLevel {
    type Err = ParsePriorityLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(PriorityLevel::Normal),
            "high" => Ok(PriorityLevel::High),
            "realtime" | "rt" => Ok(PriorityLevel::Realtime),
            _ => Err(ParsePriorityLevelError(s.to_string())),
        }
    }
}

/// Set the priority of the calling process.
///
/// # Errors
///
/// - [`PriorityError::Os`] when the OS refuses, e.g. without privileges
/// - [`PriorityError::Unsupported`] on platforms with no priority API
pub fn set_process_priority(level: PriorityLevel) -> PriorityResult {
    platform::set_process_priority(level)
}

/// Try to set the process priority, logging instead of failing.
///
/// Returns whether the request was accepted.
pub fn elevate_best_effort(level: PriorityLevel) -> bool {
    match set_process_priority(level) {
        Ok(()) => {
            info!(%level, "process priority set");
            true
        }
        Err(e) => {
            warn!(%level, error = %e, "failed to set process priority - continuing at default");
            false
        }
    }
}
