//! Fixed-grid dispatch engine.
//!
//! This module provides [`Timer`], which invokes an [`Action`] at
//! `anchor + n * period` for call index `n` and records lag, execution time
//! and overtime for every call.

use crate::action::Action;
use crate::clock::{Clock, MonotonicClock, Timestamp};
use crate::error::TimerResult;
use crate::period::Period;
use crate::stats::{SharedStats, StatsRecord, TimerSample, TimerSampler};
use crossbeam::atomic::AtomicCell;
use std::sync::Arc;
use tracing::debug;

/// Periodic dispatcher driven by an external polling loop.
///
/// The timer never sleeps or spawns anything. Something has to call
/// [`poll`](Self::poll) repeatedly: a hand-written loop, or a
/// [`TimerThread`](crate::TimerThread).
///
/// Due times form a fixed grid anchored at the first poll. A late call does
/// not move later due times; if the polling loop falls several periods
/// behind, successive polls dispatch back-to-back until the grid is caught
/// up.
///
/// # RT-Safety
///
/// - `poll` is O(1) and allocation-free
/// - a poll that is not due reads the clock once and returns
/// - statistics are published as one copied record per call, never torn
///
/// # Example
///
/// ```
/// use rt_timer::{Period, Timer};
///
/// let period = Period::from_rate_hz(1_000.0)?;
/// let mut timer = Timer::new(period, || {
///     // control loop body
/// });
///
/// for _ in 0..10 {
///     timer.poll();
/// }
/// let sample = timer.sample();
/// assert!(sample.call_count >= 1);
/// # Ok::<(), rt_timer::PeriodError>(())
/// ```
pub struct Timer<A, C: Clock = MonotonicClock> {
    period: Period,
    action: A,
    clock: C,
    anchor: Option<Timestamp>,
    next_due: Timestamp,
    record: StatsRecord,
    shared: SharedStats,
    sampler: TimerSampler<C>,
}

impl<A: Action> Timer<A, MonotonicClock> {
    /// Timer on the OS monotonic clock.
    pub fn new(period: Period, action: A) -> Self {
        Self::with_clock(period, action, MonotonicClock::new())
    }

    /// Timer with a period given in seconds.
    ///
    /// # Errors
    ///
    /// [`TimerError::InvalidPeriod`](crate::TimerError::InvalidPeriod) if
    /// `period_secs` is not a positive, finite number of at least 1ns.
    pub fn from_secs_f64(period_secs: f64, action: A) -> TimerResult<Self> {
        Ok(Self::new(Period::from_secs_f64(period_secs)?, action))
    }

    /// Timer calling `action` `rate_hz` times per second.
    ///
    /// # Errors
    ///
    /// [`TimerError::InvalidPeriod`](crate::TimerError::InvalidPeriod) if
    /// `rate_hz` is not a positive, finite rate.
    pub fn from_rate_hz(rate_hz: f64, action: A) -> TimerResult<Self> {
        Ok(Self::new(Period::from_rate_hz(rate_hz)?, action))
    }
}

impl<A: Action, C: Clock> Timer<A, C> {
    /// Timer reading time from `clock`.
    pub fn with_clock(period: Period, action: A, clock: C) -> Self {
        let shared: SharedStats = Arc::new(AtomicCell::new(StatsRecord::default()));
        let sampler = TimerSampler::new(Arc::clone(&shared), clock.clone(), period);
        Self {
            period,
            action,
            clock,
            anchor: None,
            next_due: Timestamp::ZERO,
            record: StatsRecord::default(),
            shared,
            sampler,
        }
    }

    /// Dispatch the action if it is due.
    ///
    /// The first poll after construction or [`reset`](Self::reset) anchors
    /// the schedule at the current time and dispatches immediately.
    ///
    /// Returns the next due time. Callers may use it to decide how long to
    /// idle; polling again early is always correct.
    #[inline]
    pub fn poll(&mut self) -> Timestamp {
        let now = self.clock.now();
        let anchor = match self.anchor {
            Some(anchor) => anchor,
            None => self.anchor_at(now),
        };

        if now < self.next_due {
            return self.next_due;
        }
        self.dispatch(now, anchor)
    }

    fn anchor_at(&mut self, now: Timestamp) -> Timestamp {
        debug!(
            anchor_ns = now.as_nanos(),
            period_ns = self.period.as_nanos(),
            "timer anchored"
        );
        self.anchor = Some(now);
        self.next_due = now;
        self.record.anchor = Some(now);
        self.shared.store(self.record);
        now
    }

    fn dispatch(&mut self, now: Timestamp, anchor: Timestamp) -> Timestamp {
        self.action.invoke();
        let elapsed_ns = self.clock.now().nanos_since(now);
        let lag_ns = now.nanos_since(self.next_due);
        self.record.record_call(lag_ns, elapsed_ns, self.period);
        self.next_due = grid_point(anchor, self.record.call_count, self.period);
        self.shared.store(self.record);
        self.next_due
    }

    /// Snapshot statistics, windowed since the previous call to this method.
    ///
    /// Samplers obtained from [`sampler`](Self::sampler) keep separate
    /// windows and are unaffected.
    pub fn sample(&mut self) -> TimerSample {
        self.sampler.sample()
    }

    /// Independent sampler for use on another thread.
    pub fn sampler(&self) -> TimerSampler<C> {
        TimerSampler::new(Arc::clone(&self.shared), self.clock.clone(), self.period)
    }

    /// Zero all statistics and clear the anchor.
    ///
    /// The next poll re-anchors the grid at the then-current time. Every
    /// sampler drops its window when it next observes the reset.
    pub fn reset(&mut self) {
        debug!(call_count = self.record.call_count, "timer reset");
        self.anchor = None;
        self.next_due = Timestamp::ZERO;
        self.record.reset();
        self.shared.store(self.record);
        self.sampler.reset();
    }

    /// Target period.
    #[inline]
    pub fn period(&self) -> Period {
        self.period
    }

    /// Schedule anchor, `None` before the first poll.
    #[inline]
    pub fn anchor(&self) -> Option<Timestamp> {
        self.anchor
    }

    /// Due time of the next call, `None` before the first poll.
    #[inline]
    pub fn next_due(&self) -> Option<Timestamp> {
        self.anchor.map(|_| self.next_due)
    }

    /// Due time of call index `n` (0-based), `None` before the first poll.
    pub fn due_time(&self, n: u64) -> Option<Timestamp> {
        self.anchor.map(|anchor| grid_point(anchor, n, self.period))
    }

    /// Calls dispatched since construction or the last reset.
    #[inline]
    pub fn call_count(&self) -> u64 {
        self.record.call_count
    }

    /// Calls whose lag plus execution time exceeded one period.
    #[inline]
    pub fn overtime_count(&self) -> u64 {
        self.record.overtime_count
    }

    /// The clock the timer reads.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The dispatched action.
    pub fn action(&self) -> &A {
        &self.action
    }

    /// Mutable access to the dispatched action between polls.
    pub fn action_mut(&mut self) -> &mut A {
        &mut self.action
    }

    /// Consume the timer and return its action.
    pub fn into_action(self) -> A {
        self.action
    }
}

impl<A, C: Clock> std::fmt::Debug for Timer<A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("period", &self.period)
            .field("anchor", &self.anchor)
            .field("next_due", &self.next_due)
            .field("call_count", &self.record.call_count)
            .field("overtime_count", &self.record.overtime_count)
            .finish_non_exhaustive()
    }
}

#[inline]
fn grid_point(anchor: Timestamp, index: u64, period: Period) -> Timestamp {
    anchor.add_nanos(index.saturating_mul(period.as_nanos()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicU64, Ordering};

    const PERIOD_NS: u64 = 1_000_000;

    fn period() -> Period {
        match Period::from_nanos(PERIOD_NS) {
            Ok(period) => period,
            Err(e) => panic!("valid period rejected: {e}"),
        }
    }

    fn counting_timer(clock: &ManualClock) -> (Arc<AtomicU64>, Timer<impl Action, ManualClock>) {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let timer = Timer::with_clock(
            period(),
            move || {
                counter.fetch_add(1, Ordering::Relaxed);
            },
            clock.clone(),
        );
        (calls, timer)
    }

    #[test]
    fn test_first_poll_anchors_and_dispatches() {
        let clock = ManualClock::starting_at(Timestamp::from_nanos(500));
        let (calls, mut timer) = counting_timer(&clock);

        assert_eq!(timer.anchor(), None);
        let next = timer.poll();

        assert_eq!(timer.anchor(), Some(Timestamp::from_nanos(500)));
        assert_eq!(next, Timestamp::from_nanos(500 + PERIOD_NS));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(timer.call_count(), 1);
    }

    #[test]
    fn test_poll_before_due_has_no_side_effects() {
        let clock = ManualClock::new();
        let (calls, mut timer) = counting_timer(&clock);
        let _next = timer.poll();

        clock.advance_nanos(PERIOD_NS - 1);
        for _ in 0..100 {
            assert_eq!(timer.poll(), Timestamp::from_nanos(PERIOD_NS));
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        clock.advance_nanos(1);
        let _next = timer.poll();
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_lag_measured_against_grid() {
        let clock = ManualClock::new();
        let (_calls, mut timer) = counting_timer(&clock);
        let _next = timer.poll();

        clock.advance_nanos(PERIOD_NS + 250_000);
        let next = timer.poll();

        // the late call does not shift the grid
        assert_eq!(next, Timestamp::from_nanos(2 * PERIOD_NS));
        let sample = timer.sample();
        assert_eq!(sample.max_lag_ns, 250_000);
        assert_eq!(sample.overtime_count, 0);
    }

    #[test]
    fn test_falling_behind_catches_up_without_skipping() {
        let clock = ManualClock::new();
        let (calls, mut timer) = counting_timer(&clock);
        let _next = timer.poll();

        clock.advance_nanos(3 * PERIOD_NS + 10);
        let mut polls = 0;
        while timer.poll() <= clock.now() {
            polls += 1;
        }

        assert_eq!(polls, 2);
        assert_eq!(calls.load(Ordering::Relaxed), 4);
        // each catch-up call was more than a period late except the last
        assert_eq!(timer.overtime_count(), 2);
        assert_eq!(timer.next_due(), Some(Timestamp::from_nanos(4 * PERIOD_NS)));
    }

    #[test]
    fn test_slow_action_overtimes() {
        let clock = ManualClock::new();
        let action_clock = clock.clone();
        let mut timer = Timer::with_clock(
            period(),
            move || action_clock.advance_nanos(PERIOD_NS + 1),
            clock.clone(),
        );

        for _ in 0..10 {
            let _next = timer.poll();
        }

        assert_eq!(timer.call_count(), 10);
        assert_eq!(timer.overtime_count(), 10);
    }

    #[test]
    fn test_reset_reanchors() {
        let clock = ManualClock::new();
        let (_calls, mut timer) = counting_timer(&clock);
        let _next = timer.poll();
        clock.advance_nanos(PERIOD_NS);
        let _next = timer.poll();

        timer.reset();
        assert_eq!(timer.anchor(), None);
        assert_eq!(timer.next_due(), None);
        assert_eq!(timer.sample(), TimerSample::default());

        clock.advance_nanos(123);
        let _next = timer.poll();
        assert_eq!(timer.anchor(), Some(Timestamp::from_nanos(PERIOD_NS + 123)));
        assert_eq!(timer.call_count(), 1);
    }

    #[test]
    fn test_due_time_is_grid_point() {
        let clock = ManualClock::starting_at(Timestamp::from_nanos(7));
        let (_calls, mut timer) = counting_timer(&clock);
        assert_eq!(timer.due_time(3), None);

        let _next = timer.poll();
        assert_eq!(
            timer.due_time(3),
            Some(Timestamp::from_nanos(7 + 3 * PERIOD_NS))
        );
    }

    #[test]
    fn test_action_accessors() {
        struct Steps(u32);
        impl Action for Steps {
            fn invoke(&mut self) {
                self.0 += 1;
            }
        }

        let clock = ManualClock::new();
        let mut timer = Timer::with_clock(period(), Steps(0), clock);
        let _next = timer.poll();
        assert_eq!(timer.action().0, 1);

        timer.action_mut().0 = 10;
        assert_eq!(timer.into_action().0, 10);
    }
}
