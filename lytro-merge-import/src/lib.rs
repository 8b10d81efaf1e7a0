//! Merge engine for importing one Lytro library into another.
//!
//! This crate owns the core merge logic: copying rows across the four
//! related tables while minting new primary keys, rewriting foreign keys
//! through the id remap, cascade-skipping duplicates, deleting events
//! left childless by the skips, and migrating the picture files with
//! rollback bookkeeping so that a failed run leaves no trace, neither
//! in the destination database nor on disk.

pub mod files;
pub mod housekeeping;
pub mod merge;
pub mod progress;
pub mod remap;
pub mod table_merge;
pub mod tables;

pub use files::{PictureRecord, copy_picture_files};
pub use housekeeping::delete_empty_events;
pub use merge::{MergeState, MergeStats, run_merge};
pub use progress::{LogProgress, MergeProgress, SilentProgress};
pub use remap::{DuplicateSet, IdRemap, RowId};
pub use table_merge::{MergeError, TableStats, merge_table};
pub use tables::{IdPolicy, MERGE_ORDER, MergeBehavior, TableSpec};
