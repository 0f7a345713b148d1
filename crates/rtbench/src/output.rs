//! Output formatting for sample rows and the final report

use anyhow::Error;
use colored::*;
use rt_timer::TimerSample;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Final benchmark result.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub action_rate_hz: f64,
    pub sample_rate_hz: f64,
    pub period_ns: u64,
    pub duration_factor: f64,
    pub real_time_ns: u64,
    pub passed: bool,
    pub stats: TimerSample,
}

const COLUMNS: [(&str, usize); 9] = [
    ("timer [s]", 10),
    ("real [s]", 10),
    ("RT viol", 9),
    ("max lag [us]", 13),
    ("avg lag [us]", 13),
    ("avg rate [Hz]", 14),
    ("viol [%]", 9),
    ("max exec [us]", 14),
    ("avg exec [us]", 14),
];

/// Column header for sample rows.
pub fn table_header() -> String {
    COLUMNS
        .iter()
        .map(|(name, width)| format!("{name:>width$}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One sample row, aligned under [`table_header`].
pub fn table_row(sample: &TimerSample, real_time: Duration) -> String {
    let cells = [
        format!("{:.3}", sample.timer_time().as_secs_f64()),
        format!("{:.3}", real_time.as_secs_f64()),
        sample.overtime_count.to_string(),
        format!("{:.1}", micros(sample.max_lag())),
        format!("{:.1}", micros(sample.avg_lag())),
        format!("{:.1}", sample.avg_rate_hz),
        format!("{:.3}", sample.overtime_ratio() * 100.0),
        format!("{:.1}", micros(sample.max_elapsed())),
        format!("{:.1}", micros(sample.avg_elapsed())),
    ];
    cells
        .iter()
        .zip(COLUMNS.iter())
        .map(|(cell, (_, width))| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn micros(d: Duration) -> f64 {
    d.as_secs_f64() * 1e6
}

/// Print the final report in human-readable format
pub fn print_report_human(report: &BenchReport) {
    let stats = &report.stats;
    let real_time = Duration::from_nanos(report.real_time_ns);

    println!();
    println!("{}", "Benchmark Summary:".bold());
    println!(
        "  Action rate:     {:.1} Hz (period {:.1} us, busy {:.0}%)",
        report.action_rate_hz,
        micros(Duration::from_nanos(report.period_ns)),
        report.duration_factor * 100.0
    );
    println!("  Real time:       {:.3} s", real_time.as_secs_f64());
    println!("  Timer time:      {:.3} s", stats.timer_time().as_secs_f64());
    println!("  Calls:           {}", stats.call_count);
    println!(
        "  RT violations:   {} ({:.3}%)",
        stats.overtime_count,
        stats.overtime_ratio() * 100.0
    );
    println!(
        "  Call lag:        max {:.1} us, avg {:.1} us",
        micros(stats.max_lag()),
        micros(stats.avg_lag())
    );
    println!(
        "  Execution time:  max {:.1} us, avg {:.1} us",
        micros(stats.max_elapsed()),
        micros(stats.avg_elapsed())
    );
    println!("  Average rate:    {:.1} Hz", stats.avg_rate_hz);

    let verdict = if report.passed {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    println!("  Kept pace:       {verdict}");
}

/// Print the final report in JSON format
pub fn print_report_json(report: &BenchReport) -> Result<(), serde_json::Error> {
    let output = json!({
        "success": true,
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "chain": error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
    }
}
