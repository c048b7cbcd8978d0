//! Terminal output for a migration run.
//!
//! Interactive runs get a progress bar with status lines printed above it. In
//! log-only mode the bar is hidden and every status line goes straight to
//! stdout, so the output stays readable under `tail -f` or in a log file.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::models::{Outcome, SourceTrack};

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Progress bar over the tracks of a batch. Hidden in log-only mode.
pub fn create_track_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        let style = ProgressStyle::with_template(
            "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        pb.set_style(style);
    }
    pb.set_message("Migrating");
    pb
}

/// Spinner for steps of unknown length, like reading the source library.
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        pb.set_style(
            ProgressStyle::with_template("{msg} {spinner} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Log progress periodically for tail-friendly output.
/// Only logs when in log-only mode and at specified intervals.
pub fn log_progress(current: u64, total: u64, interval: u64) {
    if is_log_only() && total > 0 && (current % interval.max(1) == 0 || current == total) {
        let pct = 100.0 * current as f64 / total as f64;
        eprintln!("[migrate] {}/{} ({:.1}%)", current, total, pct);
    }
}

/// Print a line without tearing the progress bar.
pub fn status_line(pb: &ProgressBar, line: &str) {
    if is_log_only() || pb.is_hidden() {
        println!("{}", line);
    } else {
        pb.println(line);
    }
}

/// Status line for a settled track.
pub fn outcome_line(position: usize, total: usize, track: &SourceTrack, outcome: Outcome) -> String {
    let verdict = match outcome {
        Outcome::Added => "added to favorites",
        Outcome::AlreadyPresent => "already in favorites",
        Outcome::NotFound => "NOT FOUND",
    };
    format!("[{}/{}] {}: {}", position, total, track, verdict)
}

/// Status line for a track whose resolution failed.
pub fn error_line(position: usize, total: usize, track: &SourceTrack, error: &str) -> String {
    format!("[{}/{}] {}: FAILED ({})", position, total, track, error)
}
