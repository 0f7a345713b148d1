//! Execution wrapper configuration.

use crate::idle::IdlePolicy;

/// Configuration for a [`TimerThread`](crate::TimerThread).
///
/// This struct defines how the polling thread is spawned and what it does
/// between polls.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct TimerThreadConfig {
    /// Name given to the polling thread.
    ///
    /// Shows up in debuggers, panic messages and `top -H`.
    pub thread_name: String,

    /// What the loop does between polls.
    pub idle_policy: IdlePolicy,

    /// Stack size for the polling thread (None = platform default).
    pub stack_size: Option<usize>,
}

impl Default for TimerThreadConfig {
    fn default() -> Self {
        Self {
            thread_name: "rt-timer".to_string(),
            idle_policy: IdlePolicy::BusyPoll,
            stack_size: None,
        }
    }
}

impl TimerThreadConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the idle policy.
    pub fn with_idle_policy(mut self, policy: IdlePolicy) -> Self {
        self.idle_policy = policy;
        self
    }

    /// Set the stack size in bytes.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = TimerThreadConfig::default();
        assert_eq!(config.thread_name, "rt-timer");
        assert_eq!(config.idle_policy, IdlePolicy::BusyPoll);
        assert!(config.stack_size.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = TimerThreadConfig::new()
            .with_thread_name("sampler")
            .with_idle_policy(IdlePolicy::Yield)
            .with_stack_size(256 * 1024);

        assert_eq!(config.thread_name, "sampler");
        assert_eq!(config.idle_policy, IdlePolicy::Yield);
        assert_eq!(config.stack_size, Some(256 * 1024));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial_config() -> Result<(), serde_json::Error> {
        let config: TimerThreadConfig = serde_json::from_str(
            r#"{ "idle_policy": { "kind": "sleep_until", "spin_margin_ns": 50000 } }"#,
        )?;
        assert_eq!(config.thread_name, "rt-timer");
        assert_eq!(
            config.idle_policy,
            IdlePolicy::SleepUntil {
                spin_margin_ns: 50_000
            }
        );
        Ok(())
    }
}
