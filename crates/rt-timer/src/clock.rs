//! Monotonic time sources with nanosecond timestamps.
//!
//! A [`Timestamp`] is a plain count of nanoseconds since the epoch of the
//! clock that produced it. Timestamps from clones of the same clock share an
//! epoch, so a timer and the samplers created from it can compare their
//! readings across threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Nanoseconds since a clock's epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(u64);

impl Timestamp {
    /// The clock epoch.
    pub const ZERO: Self = Self(0);

    /// Build a timestamp from a raw nanosecond count.
    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Raw nanoseconds since the epoch.
    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Nanoseconds from `earlier` to `self`, or 0 if `earlier` is later.
    #[inline]
    pub const fn nanos_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// [`nanos_since`](Self::nanos_since) as a [`Duration`].
    #[inline]
    pub const fn duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.nanos_since(earlier))
    }

    /// Offset by `nanos`, saturating at `u64::MAX`.
    #[inline]
    #[must_use]
    pub const fn add_nanos(self, nanos: u64) -> Self {
        Self(self.0.saturating_add(nanos))
    }

    /// Offset backwards by `nanos`, saturating at the epoch.
    #[inline]
    #[must_use]
    pub const fn sub_nanos(self, nanos: u64) -> Self {
        Self(self.0.saturating_sub(nanos))
    }
}

/// A monotonic time source.
///
/// Implementations must never go backwards and must be cheap to read; the
/// dispatch engine calls [`Clock::now`] on every poll.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// OS monotonic clock measured from a fixed epoch.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Clock whose epoch is the moment of construction.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Clock measured from an existing epoch.
    pub fn with_epoch(epoch: Instant) -> Self {
        Self { epoch }
    }

    /// The instant this clock counts from.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Timestamp {
        Timestamp(monotonic_ns_since(self.epoch, Instant::now()))
    }
}

fn monotonic_ns_since(epoch: Instant, now: Instant) -> u64 {
    now.checked_duration_since(epoch)
        .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Explicitly advanced clock for deterministic harnesses.
///
/// Clones share the same reading, so a test can hold one clone while the
/// timer (or an action it drives) holds another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ns: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock starting at the epoch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock starting at `start`.
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            now_ns: Arc::new(AtomicU64::new(start.as_nanos())),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.advance_nanos(nanos);
    }

    /// Move the clock forward by `nanos`.
    pub fn advance_nanos(&self, nanos: u64) {
        let mut current = self.now_ns.load(Ordering::Acquire);
        loop {
            let next = current.saturating_add(nanos);
            match self.now_ns.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Jump to `to`. Ignored if `to` is earlier than the current reading.
    pub fn set(&self, to: Timestamp) {
        self.now_ns.fetch_max(to.as_nanos(), Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Timestamp {
        Timestamp(self.now_ns.load(Ordering::Acquire))
    }
}
