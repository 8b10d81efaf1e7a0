//! Merge progress reporting.

use crate::merge::MergeStats;

/// Trait for receiving progress updates during a merge run.
pub trait MergeProgress {
    /// Called when a merge phase starts (e.g., "Copying picture files...").
    fn on_phase(&self, message: &str);

    /// Called after each table finishes merging.
    fn on_table(&self, table: &str, created: u64, skipped: u64);

    /// Called before each file copy during migration.
    fn on_file(&self, current: usize, total: usize, name: &str);

    /// Called once when the run has fully committed.
    fn on_complete(&self, stats: &MergeStats);
}

/// A no-op progress reporter that discards all updates.
pub struct SilentProgress;

impl MergeProgress for SilentProgress {
    fn on_phase(&self, _message: &str) {}
    fn on_table(&self, _table: &str, _created: u64, _skipped: u64) {}
    fn on_file(&self, _current: usize, _total: usize, _name: &str) {}
    fn on_complete(&self, _stats: &MergeStats) {}
}

/// A progress reporter that logs to the `log` crate.
pub struct LogProgress;

impl MergeProgress for LogProgress {
    fn on_phase(&self, message: &str) {
        log::info!("{}", message);
    }

    fn on_table(&self, table: &str, created: u64, skipped: u64) {
        log::info!("  {}: {} created, {} skipped", table, created, skipped);
    }

    fn on_file(&self, current: usize, total: usize, name: &str) {
        log::debug!("  [{}/{}] {}", current, total, name);
    }

    fn on_complete(&self, stats: &MergeStats) {
        log::info!(
            "Merged {} pictures ({} files copied)",
            stats.pictures_merged,
            stats.files_copied
        );
    }
}
