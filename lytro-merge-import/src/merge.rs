//! Orchestration of a full merge run.

use lytro_merge_db::LibraryPair;

use crate::files::{PictureRecord, copy_picture_files};
use crate::housekeeping::delete_empty_events;
use crate::progress::MergeProgress;
use crate::remap::{DuplicateSet, IdRemap};
use crate::table_merge::{MergeError, merge_table};
use crate::tables::MERGE_ORDER;

/// Mutable engine state threaded through one run.
#[derive(Debug, Default)]
pub struct MergeState {
    pub remap: IdRemap,
    pub duplicates: DuplicateSet,
    pub pictures: Vec<PictureRecord>,
}

/// Summary of one completed merge run.
#[derive(Debug, Default, Clone)]
pub struct MergeStats {
    /// Rows inserted across all four tables.
    pub rows_created: u64,
    /// Pictures already present in the destination, skipped with their
    /// dependent rows.
    pub duplicates_skipped: u64,
    /// Pictures merged (and migrated on disk).
    pub pictures_merged: u64,
    /// Events deleted because every one of their pictures was a duplicate.
    pub empty_events_removed: u64,
    /// Media files copied (two per merged picture).
    pub files_copied: u64,
}

/// Merge the source library of `libs` into the destination.
///
/// Table copies and housekeeping deletions all run inside a single write
/// transaction on the destination connection, committed only once every
/// picture file has been copied. Any error abandons the transaction,
/// leaving the destination database exactly as it was; a file-copy
/// failure additionally deletes everything already copied this run.
pub fn run_merge(
    libs: &LibraryPair,
    progress: &dyn MergeProgress,
) -> Result<MergeStats, MergeError> {
    let source = libs.source.conn()?;
    let dest = libs.dest.conn()?;
    let tx = dest.unchecked_transaction()?;

    let mut state = MergeState::default();
    let mut stats = MergeStats::default();

    progress.on_phase("Reading data from importing library...");
    for spec in &MERGE_ORDER {
        let table_stats = merge_table(source, &tx, spec, &mut state)?;
        progress.on_table(spec.name, table_stats.created, table_stats.skipped);
        stats.rows_created += table_stats.created;
    }
    stats.duplicates_skipped = state.duplicates.len() as u64;
    stats.pictures_merged = state.pictures.len() as u64;
    stats.empty_events_removed = delete_empty_events(&tx, &state.remap)?;

    progress.on_phase("Copying picture files...");
    stats.files_copied = copy_picture_files(&libs.source, &libs.dest, &state.pictures, progress)?;

    progress.on_phase("Writing data to main library...");
    tx.commit()?;

    progress.on_complete(&stats);
    Ok(stats)
}
