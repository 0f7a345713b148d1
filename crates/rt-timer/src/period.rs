//! Timer period as an integral nanosecond count.

use crate::error::PeriodError;
use std::num::NonZeroU64;
use std::time::Duration;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// A strictly positive timer period in whole nanoseconds.
///
/// Schedule arithmetic is done on the integer count so repeated
/// `anchor + n * period` evaluations never accumulate floating error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(NonZeroU64);

impl Period {
    /// Period from a [`Duration`].
    ///
    /// # Errors
    ///
    /// [`PeriodError::Zero`] for a zero duration, [`PeriodError::OutOfRange`]
    /// if it exceeds `u64::MAX` nanoseconds.
    pub fn new(period: Duration) -> Result<Self, PeriodError> {
        let nanos = u64::try_from(period.as_nanos()).map_err(|_| PeriodError::OutOfRange)?;
        Self::from_nanos(nanos)
    }

    /// Period from a nanosecond count.
    ///
    /// # Errors
    ///
    /// [`PeriodError::Zero`] if `nanos` is 0.
    pub fn from_nanos(nanos: u64) -> Result<Self, PeriodError> {
        NonZeroU64::new(nanos).map(Self).ok_or(PeriodError::Zero)
    }

    /// Period from seconds, rounded to the nearest nanosecond.
    ///
    /// # Errors
    ///
    /// Rejects NaN/infinite, non-positive, sub-nanosecond and oversized values.
    pub fn from_secs_f64(secs: f64) -> Result<Self, PeriodError> {
        if !secs.is_finite() {
            return Err(PeriodError::NonFinite);
        }
        if secs <= 0.0 {
            return Err(PeriodError::NonPositive);
        }
        let nanos = (secs * NANOS_PER_SEC).round();
        if nanos >= u64::MAX as f64 {
            return Err(PeriodError::OutOfRange);
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "range checked above"
        )]
        let nanos = nanos as u64;
        Self::from_nanos(nanos)
    }

    /// Period of one call at `rate_hz` calls per second.
    ///
    /// # Errors
    ///
    /// Same as [`Period::from_secs_f64`], applied to the rate.
    pub fn from_rate_hz(rate_hz: f64) -> Result<Self, PeriodError> {
        if !rate_hz.is_finite() {
            return Err(PeriodError::NonFinite);
        }
        if rate_hz <= 0.0 {
            return Err(PeriodError::NonPositive);
        }
        Self::from_secs_f64(rate_hz.recip())
    }

    /// Nanoseconds per period.
    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0.get()
    }

    /// The period as a [`Duration`].
    #[inline]
    pub const fn as_duration(self) -> Duration {
        Duration::from_nanos(self.0.get())
    }

    /// The period in seconds.
    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.as_nanos() as f64 / NANOS_PER_SEC
    }

    /// Calls per second at this period.
    #[inline]
    pub fn rate_hz(self) -> f64 {
        NANOS_PER_SEC / self.as_nanos() as f64
    }
}

impl TryFrom<Duration> for Period {
    type Error = PeriodError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Period> for Duration {
    fn from(value: Period) -> Self {
        value.as_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_duration_rejected() {
        assert_eq!(Period::new(Duration::ZERO), Err(PeriodError::Zero));
        assert_eq!(Period::from_nanos(0), Err(PeriodError::Zero));
    }

    #[test]
    fn test_from_secs() {
        let period = Period::from_secs_f64(1e-3).map(Period::as_nanos);
        assert_eq!(period, Ok(1_000_000));
    }

    #[test]
    fn test_from_rate() {
        let period = Period::from_rate_hz(2_500.0).map(Period::as_nanos);
        assert_eq!(period, Ok(400_000));
    }

    #[test]
    fn test_invalid_seconds() {
        assert_eq!(Period::from_secs_f64(0.0), Err(PeriodError::NonPositive));
        assert_eq!(Period::from_secs_f64(-1.0), Err(PeriodError::NonPositive));
        assert_eq!(Period::from_secs_f64(f64::NAN), Err(PeriodError::NonFinite));
        assert_eq!(
            Period::from_secs_f64(f64::INFINITY),
            Err(PeriodError::NonFinite)
        );
        assert_eq!(Period::from_secs_f64(1e-10), Err(PeriodError::Zero));
        assert_eq!(Period::from_secs_f64(1e12), Err(PeriodError::OutOfRange));
    }

    #[test]
    fn test_invalid_rate() {
        assert_eq!(Period::from_rate_hz(0.0), Err(PeriodError::NonPositive));
        assert_eq!(Period::from_rate_hz(-5.0), Err(PeriodError::NonPositive));
        assert_eq!(Period::from_rate_hz(f64::NAN), Err(PeriodError::NonFinite));
        assert_eq!(Period::from_rate_hz(1e12), Err(PeriodError::Zero));
    }

    #[test]
    fn test_conversions() -> Result<(), PeriodError> {
        let period = Period::try_from(Duration::from_millis(2))?;
        assert_eq!(Duration::from(period), Duration::from_millis(2));
        assert!((period.rate_hz() - 500.0).abs() < 1e-9);
        assert!((period.as_secs_f64() - 0.002).abs() < 1e-12);
        Ok(())
    }
}
