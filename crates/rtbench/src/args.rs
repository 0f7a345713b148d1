//! Command-line arguments and their validation.

use clap::{Parser, ValueEnum};
use rt_timer::{IdlePolicy, Period};
use rt_timer_priority::PriorityLevel;
use std::time::Duration;

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "rtbench")]
#[command(about = "Measure how well a periodic timer keeps its rate on this machine")]
#[command(version)]
#[command(long_about = "
rtbench runs a busy-waiting action at a fixed rate on a dedicated thread and
samples its timing statistics from a second, slower timer thread.

Each sample row shows how far calls lagged behind their scheduled time, how
long the action ran and how many calls violated the real-time budget (lag
plus execution time longer than one period).

Without --duration the benchmark runs until Enter is pressed.
")]
pub struct Cli {
    /// Action rate in Hz
    #[arg(short, long, env = "RTBENCH_ACTION_RATE", default_value_t = 10_000.0)]
    pub action_rate: f64,

    /// Sample (report) rate in Hz
    #[arg(short, long, env = "RTBENCH_SAMPLE_RATE", default_value_t = 0.8)]
    pub sample_rate: f64,

    /// Action busy time as a fraction of the action period
    #[arg(short = 'f', long, env = "RTBENCH_DURATION_FACTOR", default_value_t = 0.1)]
    pub duration_factor: f64,

    /// Run for this many seconds instead of waiting for Enter
    #[arg(short, long, env = "RTBENCH_DURATION")]
    pub duration: Option<f64>,

    /// What the action thread does between polls
    #[arg(long, value_enum, env = "RTBENCH_IDLE", default_value_t = IdleArg::Busy)]
    pub idle: IdleArg,

    /// Process priority to request at startup (normal, high, realtime)
    #[arg(long, env = "RTBENCH_PRIORITY", default_value_t = PriorityLevel::Realtime)]
    pub priority: PriorityLevel,

    /// Output the final report in JSON format and suppress sample rows
    #[arg(long, help = "Output in JSON format for machine parsing")]
    pub json: bool,

    /// Exit non-zero if any call overran its period or lagged a full period
    #[arg(long)]
    pub verify: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Idle policy names accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleArg {
    /// Poll again immediately
    Busy,
    /// CPU spin-loop hint between polls
    Spin,
    /// Yield to the OS scheduler between polls
    Yield,
    /// Sleep until shortly before the next call
    Sleep,
}

impl From<IdleArg> for IdlePolicy {
    fn from(arg: IdleArg) -> Self {
        match arg {
            IdleArg::Busy => IdlePolicy::BusyPoll,
            IdleArg::Spin => IdlePolicy::SpinHint,
            IdleArg::Yield => IdlePolicy::Yield,
            IdleArg::Sleep => IdlePolicy::sleep_with_default_margin(),
        }
    }
}

/// How long the benchmark runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLength {
    Fixed(Duration),
    UntilEnter,
}

/// Validated benchmark parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchPlan {
    pub action_period: Period,
    pub sample_period: Period,
    pub duration_factor: f64,
    pub busy_time: Duration,
    pub run_length: RunLength,
    pub idle: IdlePolicy,
    pub priority: PriorityLevel,
}

impl Cli {
    /// Check argument ranges and derive the benchmark plan.
    pub fn plan(&self) -> Result<BenchPlan, CliError> {
        let action_period = rate_to_period("action rate", self.action_rate)?;
        let sample_period = rate_to_period("sample rate", self.sample_rate)?;
        if self.sample_rate > self.action_rate {
            return Err(CliError::SampleRateAboveActionRate {
                sample_hz: self.sample_rate,
                action_hz: self.action_rate,
            });
        }

        if !self.duration_factor.is_finite() || self.duration_factor < 0.0 {
            return Err(CliError::InvalidDurationFactor(self.duration_factor));
        }
        let busy_time =
            Duration::try_from_secs_f64(action_period.as_secs_f64() * self.duration_factor)
                .map_err(|_| CliError::InvalidDurationFactor(self.duration_factor))?;

        let run_length = match self.duration {
            None => RunLength::UntilEnter,
            Some(secs) => Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|d| !d.is_zero())
                .map(RunLength::Fixed)
                .ok_or(CliError::InvalidDuration(secs))?,
        };

        Ok(BenchPlan {
            action_period,
            sample_period,
            duration_factor: self.duration_factor,
            busy_time,
            run_length,
            idle: self.idle.into(),
            priority: self.priority,
        })
    }
}

fn rate_to_period(name: &'static str, value: f64) -> Result<Period, CliError> {
    Period::from_rate_hz(value).map_err(|_| CliError::InvalidRate { name, value })
}
