//! Batch progress reporting with ETA estimation

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe progress tracker shared by the conversion workers
pub struct ProgressTracker {
    total: u64,
    processed: AtomicU64,
    failed: AtomicU64,
    start_time: Instant,
    label: String,
}

impl ProgressTracker {
    /// Creates a new progress tracker
    pub fn new(total: u64, label: &str) -> Self {
        Self {
            total,
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            start_time: Instant::now(),
            label: label.to_string(),
        }
    }

    /// Records one finished item and logs progress every `report_interval` items
    pub fn record(&self, succeeded: bool, report_interval: u64) {
        if !succeeded {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        let current = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if current % report_interval.max(1) == 0 || current == self.total {
            self.report(current);
        }
    }

    /// Number of items recorded so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Number of items recorded as failed
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn report(&self, current: u64) {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let failed = self.failed();

        if current < self.total {
            let percent = current as f64 / self.total as f64 * 100.0;
            let rate = current as f64 / elapsed_secs.max(f64::EPSILON);
            let remaining = (self.total - current) as f64 / rate;
            log::info!(
                "{} {}/{} ({:.1}%, {} failed) - elapsed: {} - ETA: {}",
                self.label,
                current,
                self.total,
                percent,
                failed,
                format_duration(elapsed_secs),
                format_duration(remaining),
            );
        } else {
            log::info!(
                "{} {}/{} ({} failed) - completed in {}",
                self.label,
                current,
                self.total,
                failed,
                format_duration(elapsed_secs),
            );
        }
    }
}

/// Formats seconds into a human-readable duration string
fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor() as u64;
        format!("{}m {:.0}s", mins, secs - mins as f64 * 60.0)
    } else {
        let hours = (secs / 3600.0).floor() as u64;
        let mins = ((secs - hours as f64 * 3600.0) / 60.0).floor() as u64;
        let rest = secs - hours as f64 * 3600.0 - mins as f64 * 60.0;
        format!("{}h {}m {:.0}s", hours, mins, rest)
    }
}
