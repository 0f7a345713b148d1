//! Prelude module for common timer types.
//!
//! `use rt_timer::prelude::*;` brings in everything needed to build, run
//! and sample a timer.

pub use crate::action::Action;
pub use crate::clock::{Clock, MonotonicClock, Timestamp};
pub use crate::config::TimerThreadConfig;
pub use crate::error::{TimerError, TimerResult};
pub use crate::idle::IdlePolicy;
pub use crate::period::Period;
pub use crate::stats::{TimerSample, TimerSampler};
pub use crate::thread::TimerThread;
pub use crate::timer::Timer;
