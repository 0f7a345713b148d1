//! What the polling loop does between polls.

use crate::clock::{Clock, Timestamp};
use std::time::Duration;

/// Idle strategy applied by [`TimerThread`](crate::TimerThread) after each
/// poll.
///
/// [`IdlePolicy::BusyPoll`] is the default. Sleeping until the due time
/// looks attractive, but at rates of roughly 100-900 Hz the OS wake-up
/// jitter exceeds the lag a control loop can tolerate and the achieved rate
/// collapses. Busy polling trades a full core for schedule fidelity; the
/// other policies trade some fidelity back for CPU time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum IdlePolicy {
    /// Poll again immediately.
    #[default]
    BusyPoll,
    /// Issue a CPU spin-loop hint between polls.
    SpinHint,
    /// Yield the rest of the time slice to the OS scheduler.
    Yield,
    /// Sleep until `spin_margin_ns` before the next due time, then resume
    /// polling. Without a margin the wake-up lands late by the OS jitter.
    SleepUntil {
        /// Time before the due point at which sleeping stops.
        spin_margin_ns: u64,
    },
}

impl IdlePolicy {
    /// Sleep policy with a margin suited to typical desktop schedulers.
    pub const fn sleep_with_default_margin() -> Self {
        Self::SleepUntil {
            spin_margin_ns: 80_000,
        }
    }

    /// Idle once, given the next due time returned by the last poll.
    #[inline]
    pub fn idle<C: Clock>(&self, clock: &C, next_due: Timestamp) {
        match *self {
            IdlePolicy::BusyPoll => {}
            IdlePolicy::SpinHint => std::hint::spin_loop(),
            IdlePolicy::Yield => std::thread::yield_now(),
            IdlePolicy::SleepUntil { spin_margin_ns } => {
                let wake = next_due.sub_nanos(spin_margin_ns);
                let remaining = wake.nanos_since(clock.now());
                if remaining > 0 {
                    std::thread::sleep(Duration::from_nanos(remaining));
                }
            }
        }
    }
}
