//! rtbench - periodic timer benchmark
//!
//! Runs a busy-waiting action at a fixed rate and reports how well the rate
//! was kept: call lag, execution time and real-time violations.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod args;
mod bench;
mod error;
mod output;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::Cli;
use crate::error::CliError;

/// Exit code when `--verify` finds a missed deadline.
const EXIT_VERIFY_FAILED: u8 = 2;
/// Exit code for invalid arguments.
const EXIT_USAGE: u8 = 4;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let default_filter =
        format!("rtbench={log_level},rt_timer={log_level},rt_timer_priority={log_level}");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute(&cli) {
        Ok(passed) if passed || !cli.verify => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_VERIFY_FAILED),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            match e.downcast_ref::<CliError>() {
                Some(err) if err.is_usage_error() => ExitCode::from(EXIT_USAGE),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

/// Run the benchmark and print the report. Returns whether it kept pace.
fn execute(cli: &Cli) -> Result<bool> {
    let plan = cli.plan()?;
    let report = bench::run(&plan, cli.json)?;

    if cli.json {
        output::print_report_json(&report).map_err(CliError::from)?;
    } else {
        output::print_report_human(&report);
    }
    Ok(report.passed)
}
