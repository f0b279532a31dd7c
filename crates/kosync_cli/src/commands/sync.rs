//! Sync command implementation.

use crate::config::Settings;
use crate::hook;
use kosync_engine::{DownloadPolicy, SyncEngine, SyncReport};
use std::error::Error;

/// Runs one sync and fires the hook if anything new arrived.
pub fn run(
    settings: &Settings,
    policy: DownloadPolicy,
    on_change: &[String],
) -> Result<(), Box<dyn Error>> {
    let config = settings.sync_config(policy)?;
    let engine = SyncEngine::over_http(config)?;
    let report = engine.run()?;
    finish(&report, on_change)
}

/// Prints the outcome, fires the hook if anything new arrived, and fails if
/// any download did.
pub fn finish(report: &SyncReport, on_change: &[String]) -> Result<(), Box<dyn Error>> {
    println!("{}", summary(report));
    for failure in &report.failures {
        println!("  failed: {} ({})", failure.id, failure.error);
    }

    if report.downloaded > 0 && !on_change.is_empty() {
        let status = hook::run(on_change, report.downloaded)?;
        if !status.success() {
            tracing::warn!(%status, "on-change hook failed");
        }
    }

    if report.failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} of {} downloads failed", report.failures.len(), report.requested).into())
    }
}

/// One-line description of a finished run.
pub fn summary(report: &SyncReport) -> String {
    match report.downloaded {
        0 if report.is_up_to_date() => "Library is up to date".to_string(),
        1 => "Downloaded 1 new book".to_string(),
        n => format!("Downloaded {n} new books"),
    }
}
