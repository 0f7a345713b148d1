//! Timer statistics: the published record and windowed sampling.
//!
//! The polling thread owns the authoritative [`StatsRecord`] and publishes a
//! full copy into a shared [`AtomicCell`] after every change. Samplers load
//! one copy per sample, so lifetime values and window deltas always come
//! from the same consistent record even when sampling runs on another
//! thread.
//!
//! Windowed averages (rate, lag, elapsed) cover the interval since the
//! previous successful sample of the same [`TimerSampler`]. When no call
//! happened in that interval the previous averages are returned unchanged.

use crate::clock::{Clock, Timestamp};
use crate::period::Period;
use crossbeam::atomic::AtomicCell;
use std::sync::Arc;
use std::time::Duration;

/// Counters and accumulators maintained by the polling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct StatsRecord {
    /// Bumped by every reset.
    pub generation: u64,
    /// Schedule anchor, `None` until the first poll after construction/reset.
    pub anchor: Option<Timestamp>,
    pub call_count: u64,
    pub overtime_count: u64,
    pub lag_sum_ns: u64,
    pub lag_max_ns: u64,
    pub elapsed_sum_ns: u64,
    pub elapsed_max_ns: u64,
}

impl StatsRecord {
    /// Fold one dispatched call into the record.
    ///
    /// The call counts as overtime when `lag + elapsed > period`.
    #[inline]
    pub fn record_call(&mut self, lag_ns: u64, elapsed_ns: u64, period: Period) {
        self.call_count = self.call_count.saturating_add(1);
        self.lag_sum_ns = self.lag_sum_ns.saturating_add(lag_ns);
        self.lag_max_ns = self.lag_max_ns.max(lag_ns);
        self.elapsed_sum_ns = self.elapsed_sum_ns.saturating_add(elapsed_ns);
        self.elapsed_max_ns = self.elapsed_max_ns.max(elapsed_ns);

        if lag_ns.saturating_add(elapsed_ns) > period.as_nanos() {
            self.overtime_count = self.overtime_count.saturating_add(1);
        }
    }

    /// Zero everything and start a new generation.
    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation.wrapping_add(1),
            ..Self::default()
        };
    }
}

/// Shared, single-writer publication slot for [`StatsRecord`].
pub(crate) type SharedStats = Arc<AtomicCell<StatsRecord>>;

/// Averages over one sampling window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct WindowAverages {
    rate_hz: f64,
    lag_ns: u64,
    elapsed_ns: u64,
}

/// Point in time a window starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Baseline {
    call_count: u64,
    lag_sum_ns: u64,
    elapsed_sum_ns: u64,
    at: Timestamp,
}

impl Baseline {
    fn origin(anchor: Timestamp) -> Self {
        Self {
            call_count: 0,
            lag_sum_ns: 0,
            elapsed_sum_ns: 0,
            at: anchor,
        }
    }
}

/// One statistics snapshot of a timer.
///
/// `timer_time_ns`, the maxima and the counters cover the timer's lifetime
/// since construction or the last reset. `avg_*` values cover the window
/// since the sampler's previous successful sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimerSample {
    /// Schedule time covered by completed calls (`call_count * period`).
    pub timer_time_ns: u64,
    /// Largest call lag observed.
    pub max_lag_ns: u64,
    /// Longest action execution observed.
    pub max_elapsed_ns: u64,
    /// Calls dispatched.
    pub call_count: u64,
    /// Calls where lag plus execution time exceeded one period.
    pub overtime_count: u64,
    /// Achieved call rate over the window, in Hz.
    pub avg_rate_hz: f64,
    /// Mean call lag over the window.
    pub avg_lag_ns: u64,
    /// Mean action execution time over the window.
    pub avg_elapsed_ns: u64,
}

impl TimerSample {
    /// [`timer_time_ns`](Self::timer_time_ns) as a [`Duration`].
    pub fn timer_time(&self) -> Duration {
        Duration::from_nanos(self.timer_time_ns)
    }

    /// [`max_lag_ns`](Self::max_lag_ns) as a [`Duration`].
    pub fn max_lag(&self) -> Duration {
        Duration::from_nanos(self.max_lag_ns)
    }

    /// [`max_elapsed_ns`](Self::max_elapsed_ns) as a [`Duration`].
    pub fn max_elapsed(&self) -> Duration {
        Duration::from_nanos(self.max_elapsed_ns)
    }

    /// [`avg_lag_ns`](Self::avg_lag_ns) as a [`Duration`].
    pub fn avg_lag(&self) -> Duration {
        Duration::from_nanos(self.avg_lag_ns)
    }

    /// [`avg_elapsed_ns`](Self::avg_elapsed_ns) as a [`Duration`].
    pub fn avg_elapsed(&self) -> Duration {
        Duration::from_nanos(self.avg_elapsed_ns)
    }

    /// Fraction of calls that overtimed (0.0 to 1.0), 0 before any call.
    pub fn overtime_ratio(&self) -> f64 {
        if self.call_count == 0 {
            0.0
        } else {
            self.overtime_count as f64 / self.call_count as f64
        }
    }

    /// Whether no call overtimed and the worst lag stayed below `period`.
    pub fn kept_pace(&self, period: Period) -> bool {
        self.overtime_count == 0 && self.max_lag_ns < period.as_nanos()
    }
}

/// Windowed view onto a timer's statistics.
///
/// Obtained from [`Timer::sampler`](crate::Timer::sampler) or
/// [`TimerThread::sampler`](crate::TimerThread::sampler). It is `Send`, so it
/// can be moved into the action of a second, slower timer that reports on
/// the first. Each sampler keeps its own window; two samplers on the same
/// timer do not shorten each other's windows.
#[derive(Debug)]
pub struct TimerSampler<C: Clock> {
    shared: SharedStats,
    clock: C,
    period: Period,
    generation: u64,
    baseline: Option<Baseline>,
    cached: WindowAverages,
}

impl<C: Clock> TimerSampler<C> {
    pub(crate) fn new(shared: SharedStats, clock: C, period: Period) -> Self {
        let generation = shared.load().generation;
        Self {
            shared,
            clock,
            period,
            generation,
            baseline: None,
            cached: WindowAverages::default(),
        }
    }

    /// Period of the sampled timer.
    pub fn period(&self) -> Period {
        self.period
    }

    /// Take a snapshot.
    ///
    /// Never fails: before the first call, or when no call happened since
    /// the previous sample, the windowed averages repeat the last computed
    /// values (zero if none were ever computed).
    pub fn sample(&mut self) -> TimerSample {
        let record = self.shared.load();
        let now = self.clock.now();

        if record.generation != self.generation {
            self.forget_window();
            self.generation = record.generation;
        }

        if let Some(baseline) = self.window_start(&record) {
            self.advance_window(&record, baseline, now);
        }

        TimerSample {
            timer_time_ns: record.call_count.saturating_mul(self.period.as_nanos()),
            max_lag_ns: record.lag_max_ns,
            max_elapsed_ns: record.elapsed_max_ns,
            call_count: record.call_count,
            overtime_count: record.overtime_count,
            avg_rate_hz: self.cached.rate_hz,
            avg_lag_ns: self.cached.lag_ns,
            avg_elapsed_ns: self.cached.elapsed_ns,
        }
    }

    /// Drop the window baseline and cached averages.
    pub fn reset(&mut self) {
        self.forget_window();
        self.generation = self.shared.load().generation;
    }

    fn forget_window(&mut self) {
        self.baseline = None;
        self.cached = WindowAverages::default();
    }

    fn window_start(&mut self, record: &StatsRecord) -> Option<Baseline> {
        if self.baseline.is_none() {
            self.baseline = record.anchor.map(Baseline::origin);
        }
        self.baseline
    }

    fn advance_window(&mut self, record: &StatsRecord, baseline: Baseline, now: Timestamp) {
        let calls = record.call_count.saturating_sub(baseline.call_count);
        let window_ns = now.nanos_since(baseline.at);
        if calls == 0 || window_ns == 0 {
            return;
        }

        let lag_ns = record.lag_sum_ns.saturating_sub(baseline.lag_sum_ns);
        let elapsed_ns = record.elapsed_sum_ns.saturating_sub(baseline.elapsed_sum_ns);
        self.cached = WindowAverages {
            rate_hz: calls as f64 / Duration::from_nanos(window_ns).as_secs_f64(),
            lag_ns: lag_ns / calls,
            elapsed_ns: elapsed_ns / calls,
        };
        self.baseline = Some(Baseline {
            call_count: record.call_count,
            lag_sum_ns: record.lag_sum_ns,
            elapsed_sum_ns: record.elapsed_sum_ns,
            at: now,
        });
    }
}

impl<C: Clock> Clone for TimerSampler<C> {
    /// A clone starts a fresh window on the same timer.
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.shared), self.clock.clone(), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const PERIOD_NS: u64 = 1_000_000;

    fn period() -> Period {
        match Period::from_nanos(PERIOD_NS) {
            Ok(period) => period,
            Err(e) => panic!("valid period rejected: {e}"),
        }
    }

    fn sampler(clock: &ManualClock) -> (SharedStats, TimerSampler<ManualClock>) {
        let shared: SharedStats = Arc::new(AtomicCell::new(StatsRecord::default()));
        let sampler = TimerSampler::new(Arc::clone(&shared), clock.clone(), period());
        (shared, sampler)
    }

    #[test]
    fn test_record_call_updates_sums_and_maxima() {
        let mut record = StatsRecord::default();
        record.record_call(10, 100, period());
        record.record_call(30, 50, period());

        assert_eq!(record.call_count, 2);
        assert_eq!(record.lag_sum_ns, 40);
        assert_eq!(record.lag_max_ns, 30);
        assert_eq!(record.elapsed_sum_ns, 150);
        assert_eq!(record.elapsed_max_ns, 100);
        assert_eq!(record.overtime_count, 0);
    }

    #[test]
    fn test_overtime_counts_lag_plus_elapsed() {
        let mut record = StatsRecord::default();
        // neither alone exceeds the period, together they do
        record.record_call(600_000, 500_000, period());
        assert_eq!(record.overtime_count, 1);
        // exactly one period is not overtime
        record.record_call(0, PERIOD_NS, period());
        assert_eq!(record.overtime_count, 1);
        assert_eq!(record.call_count, 2);
    }

    #[test]
    fn test_reset_bumps_generation() {
        let mut record = StatsRecord::default();
        record.record_call(1, 1, period());
        record.reset();
        assert_eq!(record.generation, 1);
        assert_eq!(record.call_count, 0);
        assert_eq!(record.anchor, None);
    }

    #[test]
    fn test_sample_before_anchor_is_zero() {
        let clock = ManualClock::new();
        let (_shared, mut sampler) = sampler(&clock);
        clock.advance_nanos(5_000);
        assert_eq!(sampler.sample(), TimerSample::default());
    }

    #[test]
    fn test_windowed_averages() {
        let clock = ManualClock::starting_at(Timestamp::from_nanos(1_000));
        let (shared, mut sampler) = sampler(&clock);

        let mut record = StatsRecord {
            anchor: Some(clock.now()),
            ..StatsRecord::default()
        };
        for _ in 0..4 {
            record.record_call(2_000, 10_000, period());
        }
        shared.store(record);
        clock.advance_nanos(4 * PERIOD_NS);

        let first = sampler.sample();
        assert_eq!(first.call_count, 4);
        assert_eq!(first.avg_lag_ns, 2_000);
        assert_eq!(first.avg_elapsed_ns, 10_000);
        assert!((first.avg_rate_hz - 1_000.0).abs() < 1e-6);
        assert_eq!(first.timer_time_ns, 4 * PERIOD_NS);

        // second window: two slower calls over 4 periods
        for _ in 0..2 {
            record.record_call(6_000, 30_000, period());
        }
        shared.store(record);
        clock.advance_nanos(4 * PERIOD_NS);

        let second = sampler.sample();
        assert_eq!(second.call_count, 6);
        assert_eq!(second.avg_lag_ns, 6_000);
        assert_eq!(second.avg_elapsed_ns, 30_000);
        assert!((second.avg_rate_hz - 500.0).abs() < 1e-6);
        assert_eq!(second.max_elapsed_ns, 30_000);
    }

    #[test]
    fn test_no_new_calls_repeats_cached_averages() {
        let clock = ManualClock::new();
        let (shared, mut sampler) = sampler(&clock);

        let mut record = StatsRecord {
            anchor: Some(clock.now()),
            ..StatsRecord::default()
        };
        record.record_call(100, 200, period());
        shared.store(record);
        clock.advance_nanos(PERIOD_NS);

        let first = sampler.sample();
        clock.advance_nanos(10 * PERIOD_NS);
        let second = sampler.sample();

        assert_eq!(first, second);
    }

    #[test]
    fn test_new_generation_discards_window() {
        let clock = ManualClock::new();
        let (shared, mut sampler) = sampler(&clock);

        let mut record = StatsRecord {
            anchor: Some(clock.now()),
            ..StatsRecord::default()
        };
        record.record_call(100, 200, period());
        shared.store(record);
        clock.advance_nanos(PERIOD_NS);
        assert!(sampler.sample().avg_rate_hz > 0.0);

        record.reset();
        shared.store(record);
        assert_eq!(sampler.sample(), TimerSample::default());
    }

    #[test]
    fn test_clone_starts_fresh_window() {
        let clock = ManualClock::new();
        let (shared, mut sampler) = sampler(&clock);

        let mut record = StatsRecord {
            anchor: Some(clock.now()),
            ..StatsRecord::default()
        };
        record.record_call(0, 0, period());
        shared.store(record);
        clock.advance_nanos(PERIOD_NS);
        let _first = sampler.sample();

        let mut fresh = sampler.clone();
        let from_clone = fresh.sample();
        assert_eq!(from_clone.call_count, 1);
        assert!((from_clone.avg_rate_hz - 1_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_overtime_ratio_and_pace() {
        let sample = TimerSample {
            call_count: 4,
            overtime_count: 1,
            max_lag_ns: 10,
            ..TimerSample::default()
        };
        assert!((sample.overtime_ratio() - 0.25).abs() < f64::EPSILON);
        assert!(!sample.kept_pace(period()));
        assert!(TimerSample::default().kept_pace(period()));
        assert!((TimerSample::default().overtime_ratio()).abs() < f64::EPSILON);
    }
}
