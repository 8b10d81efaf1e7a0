//! Post-merge cleanup of events left childless by duplicate skipping.

use rusqlite::{Connection, params};

use crate::remap::IdRemap;
use crate::table_merge::MergeError;

/// Delete events created by this run that ended up with no pictures.
///
/// A source event whose pictures were all skipped as duplicates arrives in
/// the destination with zero children. Only event ids minted during this
/// run are candidates; pre-existing childless destination events are left
/// untouched. Running this twice deletes nothing the second time.
pub fn delete_empty_events(dest: &Connection, remap: &IdRemap) -> Result<u64, MergeError> {
    log::debug!("Deleting empty new events...");
    let new_eids = remap.minted_ids("events");

    let mut stmt = dest.prepare(
        "SELECT events.eid, COUNT(pictures.pid) AS cnt
         FROM events
         LEFT OUTER JOIN pictures ON pictures.eid = events.eid
         GROUP BY events.eid HAVING cnt = 0",
    )?;
    let empty: Vec<i64> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    let mut deleted = 0;
    for eid in empty {
        if !new_eids.contains(&eid) {
            continue;
        }
        dest.execute("DELETE FROM events WHERE eid = ?1", params![eid])?;
        log::debug!("    events: row deleted ({})", eid);
        deleted += 1;
    }

    log::debug!("done.");
    Ok(deleted)
}
