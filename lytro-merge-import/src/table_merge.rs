//! Generic row-copy engine for one table.

use std::path::PathBuf;

use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use thiserror::Error;

use lytro_merge_db::LibraryError;

use crate::files::PictureRecord;
use crate::merge::MergeState;
use crate::remap::RowId;
use crate::tables::{
    IdPolicy, MergeBehavior, PIC_COL_EVENT, PIC_COL_GROUP, PIC_COL_NAME, TableSpec,
};

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
    #[error("Table `{table}` has {found} columns, expected at least {expected}")]
    SchemaMismatch {
        table: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Row {index} of `{table}`: unexpected type in column `{column}`")]
    BadColumn {
        table: &'static str,
        index: usize,
        column: &'static str,
    },
    #[error("Picture {pid} references {column} {id}, which is missing from the importing library")]
    DanglingReference {
        pid: i64,
        column: &'static str,
        id: i64,
    },
    #[error("Cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome counts for one merged table.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableStats {
    /// Rows inserted into the destination.
    pub created: u64,
    /// Rows omitted: cascade-skips and duplicate inserts.
    pub skipped: u64,
}

/// Copy every row of one table from the source database into the destination.
///
/// Rows are processed in source iteration order; later tables look up ids
/// assigned here, so no re-sorting. A uniqueness-constraint failure on
/// insert is the expected duplicate signal: the row is skipped, no remap
/// entry is made, and the run continues. Any other database error aborts
/// the merge.
pub fn merge_table(
    source: &Connection,
    dest: &Connection,
    spec: &TableSpec,
    state: &mut MergeState,
) -> Result<TableStats, MergeError> {
    log::debug!("Merging table `{}`...", spec.name);

    let mut select = source.prepare(&format!("SELECT * FROM {}", spec.name))?;
    let columns = select.column_count();
    if columns < spec.min_columns {
        return Err(MergeError::SchemaMismatch {
            table: spec.name,
            expected: spec.min_columns,
            found: columns,
        });
    }

    let mut insert = dest.prepare(&insert_sql(spec, columns))?;
    let mut stats = TableStats::default();

    let mut rows = select.query([])?;
    let mut index = 0usize;
    while let Some(row) = rows.next()? {
        let raw: Vec<Value> = (0..columns)
            .map(|col| row.get(col))
            .collect::<Result<_, _>>()?;
        let old_id = primary_key(&raw, spec, index)?;
        let mut data = raw.clone();

        if !pre_insert(spec, state, index, &raw, &mut data)? {
            log::debug!("    {}: row skipped ({})", spec.name, old_id);
            stats.skipped += 1;
            index += 1;
            continue;
        }

        let bound = match spec.id_policy {
            IdPolicy::Mint => &data[1..],
            IdPolicy::Preserve => &data[..],
        };
        match insert.execute(params_from_iter(bound.iter())) {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                if spec.behavior == MergeBehavior::TrackDuplicates {
                    state.duplicates.insert(index);
                }
                log::debug!("    {}: duplicate row passed ({})", spec.name, old_id);
                stats.skipped += 1;
                index += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        let new_id = match spec.id_policy {
            IdPolicy::Mint => RowId::Int(dest.last_insert_rowid()),
            IdPolicy::Preserve => old_id.clone(),
        };
        log::debug!("    {}: row created ({} -> {})", spec.name, old_id, new_id);
        state.remap.record(spec.name, old_id, new_id.clone());
        post_insert(spec, state, index, &raw, &data, &new_id)?;
        stats.created += 1;
        index += 1;
    }

    log::debug!("done.");
    Ok(stats)
}

/// Decide whether to insert the row, rewriting its buffer in place.
///
/// Returning `false` omits the row entirely: no insert attempt, no remap
/// entry. This is how a duplicate in `imported_pictures` cascades to the
/// `pictures` row at the same index.
fn pre_insert(
    spec: &TableSpec,
    state: &MergeState,
    index: usize,
    raw: &[Value],
    data: &mut [Value],
) -> Result<bool, MergeError> {
    match spec.behavior {
        MergeBehavior::Copy | MergeBehavior::TrackDuplicates => Ok(true),
        MergeBehavior::RewritePictures => {
            if state.duplicates.contains(index) {
                return Ok(false);
            }
            let pid = int_column(raw, 0, spec, index, "pid")?;
            let gid = int_column(raw, PIC_COL_GROUP, spec, index, "gid")?;
            let eid = int_column(raw, PIC_COL_EVENT, spec, index, "eid")?;

            // A miss here means the source library itself is broken;
            // inserting would plant a dangling reference, so abort.
            let new_gid = state.remap.lookup_int("import_groups", gid).ok_or(
                MergeError::DanglingReference {
                    pid,
                    column: "import group",
                    id: gid,
                },
            )?;
            let new_eid = state.remap.lookup_int("events", eid).ok_or(
                MergeError::DanglingReference {
                    pid,
                    column: "event",
                    id: eid,
                },
            )?;
            data[PIC_COL_GROUP] = Value::Integer(new_gid);
            data[PIC_COL_EVENT] = Value::Integer(new_eid);
            Ok(true)
        }
    }
}

/// Side effects after a successful insert. For `pictures`, capture the
/// record the file migrator needs: old and new ids plus the file name.
fn post_insert(
    spec: &TableSpec,
    state: &mut MergeState,
    index: usize,
    raw: &[Value],
    data: &[Value],
    new_id: &RowId,
) -> Result<(), MergeError> {
    if spec.behavior == MergeBehavior::RewritePictures
        && let RowId::Int(new_pid) = *new_id
    {
        state.pictures.push(PictureRecord {
            pid: int_column(raw, 0, spec, index, "pid")?,
            gid: int_column(raw, PIC_COL_GROUP, spec, index, "gid")?,
            eid: int_column(raw, PIC_COL_EVENT, spec, index, "eid")?,
            name: text_column(raw, PIC_COL_NAME, spec, index, "name")?,
            new_pid,
            new_gid: int_column(data, PIC_COL_GROUP, spec, index, "gid")?,
            new_eid: int_column(data, PIC_COL_EVENT, spec, index, "eid")?,
        });
    }
    Ok(())
}

fn insert_sql(spec: &TableSpec, columns: usize) -> String {
    let mut slots = Vec::with_capacity(columns);
    match spec.id_policy {
        IdPolicy::Mint => {
            slots.push("NULL".to_string());
            slots.extend((1..columns).map(|n| format!("?{n}")));
        }
        IdPolicy::Preserve => {
            slots.extend((1..=columns).map(|n| format!("?{n}")));
        }
    }
    format!("INSERT INTO {} VALUES ({})", spec.name, slots.join(", "))
}

fn primary_key(raw: &[Value], spec: &TableSpec, index: usize) -> Result<RowId, MergeError> {
    match raw.first() {
        Some(Value::Integer(v)) => Ok(RowId::Int(*v)),
        Some(Value::Text(s)) => Ok(RowId::Text(s.clone())),
        _ => Err(MergeError::BadColumn {
            table: spec.name,
            index,
            column: "primary key",
        }),
    }
}

fn int_column(
    row: &[Value],
    col: usize,
    spec: &TableSpec,
    index: usize,
    column: &'static str,
) -> Result<i64, MergeError> {
    match row.get(col) {
        Some(Value::Integer(v)) => Ok(*v),
        _ => Err(MergeError::BadColumn {
            table: spec.name,
            index,
            column,
        }),
    }
}

fn text_column(
    row: &[Value],
    col: usize,
    spec: &TableSpec,
    index: usize,
    column: &'static str,
) -> Result<String, MergeError> {
    match row.get(col) {
        Some(Value::Text(s)) => Ok(s.clone()),
        _ => Err(MergeError::BadColumn {
            table: spec.name,
            index,
            column,
        }),
    }
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
