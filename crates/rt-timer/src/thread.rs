//! Background execution of a [`Timer`] on a dedicated thread.

use crate::action::Action;
use crate::clock::{Clock, MonotonicClock};
use crate::config::TimerThreadConfig;
use crate::error::{TimerError, TimerResult};
use crate::idle::IdlePolicy;
use crate::period::Period;
use crate::stats::TimerSampler;
use crate::timer::Timer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

enum RunState<A: Action + 'static, C: Clock> {
    Idle(Timer<A, C>),
    Running {
        handle: JoinHandle<Timer<A, C>>,
        running: Arc<AtomicBool>,
    },
    /// The timer was lost to a panicked or unspawnable thread.
    Faulted,
}

/// Runs a [`Timer`]'s poll loop on its own thread.
///
/// The wrapper owns the timer. [`start`](Self::start) moves it onto a new
/// thread that polls until [`stop`](Self::stop) clears the running flag and
/// joins the thread, handing the timer back. Statistics stay readable the
/// whole time through [`sampler`](Self::sampler).
///
/// Stopping is cooperative: the flag is checked between polls, so an action
/// that is executing finishes normally, and an action that never returns
/// makes `stop` block forever.
///
/// Dropping a running wrapper stops it.
///
/// # Example
///
/// ```no_run
/// use rt_timer::{Period, Timer, TimerThread};
/// use std::time::Duration;
///
/// let timer = Timer::new(Period::from_rate_hz(1_000.0)?, || {});
/// let mut thread = TimerThread::new(timer);
/// let mut sampler = thread.sampler();
///
/// thread.run_for(Duration::from_secs(1))?;
/// let sample = sampler.sample();
/// println!("{} calls, {} overtime", sample.call_count, sample.overtime_count);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TimerThread<A: Action + 'static, C: Clock = MonotonicClock> {
    config: TimerThreadConfig,
    period: Period,
    sampler: TimerSampler<C>,
    state: RunState<A, C>,
}

impl<A: Action + 'static, C: Clock> TimerThread<A, C> {
    /// Wrap `timer` with the default configuration.
    pub fn new(timer: Timer<A, C>) -> Self {
        Self::with_config(timer, TimerThreadConfig::default())
    }

    /// Wrap `timer` with `config`.
    pub fn with_config(timer: Timer<A, C>, config: TimerThreadConfig) -> Self {
        Self {
            config,
            period: timer.period(),
            sampler: timer.sampler(),
            state: RunState::Idle(timer),
        }
    }

    /// Start polling on a new thread. No-op if already running.
    ///
    /// A polling thread that has already exited is collected first, so a
    /// panic that ended it is reported here rather than masked.
    ///
    /// # Errors
    ///
    /// - [`TimerError::ActionPanicked`] if the previous polling thread died
    ///   from a panicking action; the wrapper becomes faulted
    /// - [`TimerError::Faulted`] if an earlier failure lost the timer
    /// - [`TimerError::Spawn`] if the OS refused the thread; the timer is
    ///   lost and the wrapper becomes faulted
    pub fn start(&mut self) -> TimerResult {
        if matches!(self.state, RunState::Running { .. }) {
            if self.is_running() {
                return Ok(());
            }
            self.stop()?;
        }

        let timer = match std::mem::replace(&mut self.state, RunState::Faulted) {
            RunState::Idle(timer) => timer,
            RunState::Faulted => return Err(TimerError::Faulted),
            running @ RunState::Running { .. } => {
                self.state = running;
                return Ok(());
            }
        };

        let running = Arc::new(AtomicBool::new(true));
        let loop_running = Arc::clone(&running);
        let idle = self.config.idle_policy;

        let mut builder = thread::Builder::new().name(self.config.thread_name.clone());
        if let Some(bytes) = self.config.stack_size {
            builder = builder.stack_size(bytes);
        }

        match builder.spawn(move || poll_loop(timer, &loop_running, idle)) {
            Ok(handle) => {
                info!(
                    thread = %self.config.thread_name,
                    period_ns = self.period.as_nanos(),
                    idle = ?idle,
                    "timer thread started"
                );
                self.state = RunState::Running { handle, running };
                Ok(())
            }
            Err(e) => {
                error!(thread = %self.config.thread_name, error = %e, "failed to spawn timer thread");
                Err(TimerError::Spawn(e))
            }
        }
    }

    /// Stop polling and wait for the thread to exit. No-op if not running.
    ///
    /// Blocks until the action in progress, if any, returns.
    ///
    /// # Errors
    ///
    /// [`TimerError::ActionPanicked`] if the action panicked on the polling
    /// thread. The timer is lost and the wrapper becomes faulted.
    pub fn stop(&mut self) -> TimerResult {
        let (handle, running) = match std::mem::replace(&mut self.state, RunState::Faulted) {
            RunState::Running { handle, running } => (handle, running),
            other => {
                self.state = other;
                return Ok(());
            }
        };

        running.store(false, Ordering::Release);
        match handle.join() {
            Ok(timer) => {
                info!(
                    thread = %self.config.thread_name,
                    call_count = timer.call_count(),
                    overtime_count = timer.overtime_count(),
                    "timer thread stopped"
                );
                self.state = RunState::Idle(timer);
                Ok(())
            }
            Err(_) => {
                error!(thread = %self.config.thread_name, "timer thread panicked");
                Err(TimerError::ActionPanicked)
            }
        }
    }

    /// Start, block for `duration`, then stop.
    ///
    /// # Errors
    ///
    /// Whatever [`start`](Self::start) or [`stop`](Self::stop) report.
    pub fn run_for(&mut self, duration: Duration) -> TimerResult {
        self.start()?;
        thread::sleep(duration);
        self.stop()
    }

    /// Whether a polling thread is currently alive.
    pub fn is_running(&self) -> bool {
        match &self.state {
            RunState::Running { handle, .. } => !handle.is_finished(),
            RunState::Idle(_) | RunState::Faulted => false,
        }
    }

    /// Whether the timer was lost to an earlier failure.
    pub fn is_faulted(&self) -> bool {
        matches!(self.state, RunState::Faulted)
    }

    /// New sampler on the wrapped timer, with its own window.
    pub fn sampler(&self) -> TimerSampler<C> {
        self.sampler.clone()
    }

    /// The wrapped timer, while not running.
    pub fn timer(&self) -> Option<&Timer<A, C>> {
        match &self.state {
            RunState::Idle(timer) => Some(timer),
            RunState::Running { .. } | RunState::Faulted => None,
        }
    }

    /// Mutable access to the wrapped timer (e.g. to reset it), while not
    /// running.
    pub fn timer_mut(&mut self) -> Option<&mut Timer<A, C>> {
        match &mut self.state {
            RunState::Idle(timer) => Some(timer),
            RunState::Running { .. } | RunState::Faulted => None,
        }
    }

    /// Stop if running and return the timer.
    ///
    /// # Errors
    ///
    /// [`TimerError::ActionPanicked`] or [`TimerError::Faulted`] when the
    /// timer has been lost.
    pub fn into_timer(mut self) -> TimerResult<Timer<A, C>> {
        self.stop()?;
        match std::mem::replace(&mut self.state, RunState::Faulted) {
            RunState::Idle(timer) => Ok(timer),
            RunState::Running { .. } | RunState::Faulted => Err(TimerError::Faulted),
        }
    }

    /// Period of the wrapped timer.
    pub fn period(&self) -> Period {
        self.period
    }

    /// The configuration the wrapper was built with.
    pub fn config(&self) -> &TimerThreadConfig {
        &self.config
    }
}

impl<A: Action + 'static, C: Clock> Drop for TimerThread<A, C> {
    fn drop(&mut self) {
        if matches!(self.state, RunState::Running { .. }) {
            warn!(thread = %self.config.thread_name, "timer thread dropped while running - stopping");
            if let Err(e) = self.stop() {
                error!(error = %e, "timer thread did not stop cleanly");
            }
        }
    }
}

impl<A: Action + 'static, C: Clock> std::fmt::Debug for TimerThread<A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            RunState::Idle(_) => "idle",
            RunState::Running { .. } => "running",
            RunState::Faulted => "faulted",
        };
        f.debug_struct("TimerThread")
            .field("config", &self.config)
            .field("period", &self.period)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

fn poll_loop<A: Action, C: Clock>(
    mut timer: Timer<A, C>,
    running: &AtomicBool,
    idle: IdlePolicy,
) -> Timer<A, C> {
    while running.load(Ordering::Acquire) {
        let next_due = timer.poll();
        idle.idle(timer.clock(), next_due);
    }
    timer
}
