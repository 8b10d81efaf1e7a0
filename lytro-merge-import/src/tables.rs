//! Static descriptors for the four merged tables.
//!
//! The original schema is fixed, so the per-table configuration is data:
//! a name, a column-count floor, an id policy, and a merge behavior,
//! resolved here once instead of injected at each call site.

/// Whether destination rows get fresh primary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Strip the id column and let the destination assign a new rowid.
    Mint,
    /// Copy the row verbatim, id included. Used for `imported_pictures`,
    /// which keys off content hashes rather than library-local ids.
    Preserve,
}

/// Per-table merge behavior, resolved statically for the four known tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeBehavior {
    /// Plain row copy.
    Copy,
    /// Record the source row index of any duplicate insert, so the
    /// `pictures` row at the same index can be skipped later.
    TrackDuplicates,
    /// Skip rows whose `imported_pictures` counterpart was a duplicate,
    /// rewrite the group and event foreign keys through the id remap,
    /// and capture a [`PictureRecord`](crate::files::PictureRecord) for
    /// file migration.
    RewritePictures,
}

/// Descriptor for one merged table.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    /// Fewer columns than this in the source table is a schema mismatch.
    pub min_columns: usize,
    pub id_policy: IdPolicy,
    pub behavior: MergeBehavior,
}

/// The four tables in dependency order. Later tables reference ids
/// assigned while merging earlier ones, so this order is load-bearing.
pub static MERGE_ORDER: [TableSpec; 4] = [
    TableSpec {
        name: "events",
        min_columns: 5,
        id_policy: IdPolicy::Mint,
        behavior: MergeBehavior::Copy,
    },
    TableSpec {
        name: "import_groups",
        min_columns: 1,
        id_policy: IdPolicy::Mint,
        behavior: MergeBehavior::Copy,
    },
    TableSpec {
        name: "imported_pictures",
        min_columns: 1,
        id_policy: IdPolicy::Preserve,
        behavior: MergeBehavior::TrackDuplicates,
    },
    TableSpec {
        name: "pictures",
        min_columns: 17,
        id_policy: IdPolicy::Mint,
        behavior: MergeBehavior::RewritePictures,
    },
];

/// Column positions in `pictures` rows.
pub(crate) const PIC_COL_GROUP: usize = 1;
pub(crate) const PIC_COL_EVENT: usize = 2;
pub(crate) const PIC_COL_NAME: usize = 3;
