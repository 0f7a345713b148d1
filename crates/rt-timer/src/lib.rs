//! Fixed-grid periodic dispatch for soft real-time loops.
//!
//! This crate calls a user action at a fixed rate and measures how well the
//! rate was kept. It includes:
//!
//! - **Timer**: the dispatch engine, driven by repeated [`Timer::poll`] calls
//! - **TimerSampler**: windowed statistics readable from any thread
//! - **TimerThread**: runs a timer's poll loop on a dedicated thread
//! - **Clock**: monotonic time sources, including a manually advanced clock
//!   for deterministic tests
//!
//! Due times sit on a grid `anchor + n * period`. Lag is measured against
//! that grid, so a late call never pushes later calls back and the achieved
//! rate does not drift.
//!
//! # Example
//!
//! ```no_run
//! use rt_timer::{Period, Timer, TimerThread};
//! use std::time::Duration;
//!
//! let period = Period::from_rate_hz(1_000.0)?;
//! let mut thread = TimerThread::new(Timer::new(period, || {
//!     // control loop body
//! }));
//! let mut sampler = thread.sampler();
//!
//! thread.run_for(Duration::from_secs(1))?;
//! let sample = sampler.sample();
//! assert!(sample.kept_pace(period), "missed deadlines: {sample:?}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod action;
pub mod clock;
pub mod config;
pub mod error;
pub mod idle;
pub mod period;
pub mod stats;
pub mod thread;
pub mod timer;

pub mod prelude;

pub use action::Action;
pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use config::TimerThreadConfig;
pub use error::{PeriodError, TimerError, TimerResult};
pub use idle::IdlePolicy;
pub use period::Period;
pub use stats::{TimerSample, TimerSampler};
pub use thread::TimerThread;
pub use timer::Timer;
