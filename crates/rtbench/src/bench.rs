//! Benchmark orchestration: action thread, sampler thread, final report.

use anyhow::{Context, Result};
use rt_timer::{IdlePolicy, Timer, TimerThread, TimerThreadConfig};
use rt_timer_priority::{PriorityLevel, elevate_best_effort};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::args::{BenchPlan, RunLength};
use crate::output::{self, BenchReport};

/// Spin for `duration` without yielding, standing in for real work.
fn busy_wait(duration: Duration) {
    let start = Instant::now();
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}

/// Run the benchmark described by `plan`.
///
/// Sample rows go to stdout unless `quiet_rows` is set.
pub fn run(plan: &BenchPlan, quiet_rows: bool) -> Result<BenchReport> {
    if plan.priority != PriorityLevel::Normal {
        let _elevated = elevate_best_effort(plan.priority);
    }

    let busy_time = plan.busy_time;
    let action = Timer::new(plan.action_period, move || busy_wait(busy_time));
    let mut action_thread = TimerThread::with_config(
        action,
        TimerThreadConfig::new()
            .with_thread_name("rtbench-action")
            .with_idle_policy(plan.idle),
    );

    let mut whole_run = action_thread.sampler();
    let mut rows = action_thread.sampler();
    let started = Instant::now();
    let reporter = Timer::new(plan.sample_period, move || {
        let sample = rows.sample();
        if !quiet_rows {
            println!("{}", output::table_row(&sample, started.elapsed()));
        }
    });
    // The reporter runs far below the action rate; sleeping keeps it off
    // the action thread's core.
    let mut reporter_thread = TimerThread::with_config(
        reporter,
        TimerThreadConfig::new()
            .with_thread_name("rtbench-sampler")
            .with_idle_policy(IdlePolicy::sleep_with_default_margin()),
    );

    info!(
        action_period_ns = plan.action_period.as_nanos(),
        sample_period_ns = plan.sample_period.as_nanos(),
        busy_ns = plan.busy_time.as_nanos(),
        "starting benchmark"
    );
    if !quiet_rows {
        println!("{}", output::table_header());
    }

    action_thread
        .start()
        .context("Failed to start action timer")?;
    reporter_thread
        .start()
        .context("Failed to start sampler timer")?;

    wait(plan.run_length)?;

    reporter_thread
        .stop()
        .context("Sampler timer did not stop cleanly")?;
    action_thread
        .stop()
        .context("Action timer did not stop cleanly")?;
    let real_time = started.elapsed();

    let stats = whole_run.sample();
    debug!(?stats, "benchmark finished");

    Ok(BenchReport {
        action_rate_hz: plan.action_period.rate_hz(),
        sample_rate_hz: plan.sample_period.rate_hz(),
        period_ns: plan.action_period.as_nanos(),
        duration_factor: plan.duration_factor,
        real_time_ns: u64::try_from(real_time.as_nanos()).unwrap_or(u64::MAX),
        passed: stats.kept_pace(plan.action_period),
        stats,
    })
}

fn wait(run_length: RunLength) -> Result<()> {
    match run_length {
        RunLength::Fixed(duration) => {
            std::thread::sleep(duration);
            Ok(())
        }
        RunLength::UntilEnter => {
            eprintln!("Press Enter to stop...");
            let mut line = String::new();
            // EOF on stdin ends the run as well
            std::io::stdin()
                .read_line(&mut line)
                .context("Failed to read from stdin")?;
            Ok(())
        }
    }
}
