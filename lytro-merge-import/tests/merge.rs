use std::fs;
use std::path::Path;

use rusqlite::{Connection, params};
use tempfile::TempDir;

use lytro_merge_db::{Library, open_libraries, open_memory};
use lytro_merge_import::{
    IdRemap, MERGE_ORDER, MergeError, MergeState, RowId, SilentProgress, delete_empty_events,
    merge_table, run_merge,
};

// ── Fixture helpers ─────────────────────────────────────────────────────────

fn add_event(conn: &Connection, name: &str) -> i64 {
    conn.execute(
        "INSERT INTO events (name, description, date_created, date_modified)
         VALUES (?1, NULL, NULL, NULL)",
        params![name],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn add_group(conn: &Connection) -> i64 {
    conn.execute("INSERT INTO import_groups VALUES (NULL)", [])
        .unwrap();
    conn.last_insert_rowid()
}

fn add_imported(conn: &Connection, hash: &str) {
    conn.execute("INSERT INTO imported_pictures VALUES (?1)", params![hash])
        .unwrap();
}

fn add_picture(conn: &Connection, gid: i64, eid: i64, name: &str) -> i64 {
    conn.execute(
        "INSERT INTO pictures (gid, eid, name) VALUES (?1, ?2, ?3)",
        params![gid, eid, name],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn write_media(lib: &Library, gid: i64, pid: i64, name: &str) {
    fs::create_dir_all(lib.image_dir(gid)).unwrap();
    fs::write(lib.image_path(gid, name), format!("image {pid}")).unwrap();
    fs::write(lib.thumb_path(pid), format!("thumb {pid}")).unwrap();
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}

// ── Full-run scenarios ──────────────────────────────────────────────────────

#[test]
fn merges_a_single_picture_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let source_root = tmp.path().join("importing");
    let dest_root = tmp.path().join("main");

    let mut source = Library::create(&source_root).unwrap();
    let conn = source.conn().unwrap();
    let eid = add_event(conn, "trip");
    let gid = add_group(conn);
    add_imported(conn, "hashA");
    let pid = add_picture(conn, gid, eid, "img1.lfp");
    write_media(&source, gid, pid, "img1.lfp");
    source.close();
    Library::create(&dest_root).unwrap().close();

    let mut libs = open_libraries(&source_root, &dest_root).unwrap();
    let stats = run_merge(&libs, &SilentProgress).unwrap();

    assert_eq!(stats.pictures_merged, 1);
    assert_eq!(stats.duplicates_skipped, 0);
    assert_eq!(stats.files_copied, 2);
    assert_eq!(stats.empty_events_removed, 0);
    assert_eq!(stats.rows_created, 4);

    let dest = libs.dest.conn().unwrap();
    assert_eq!(count(dest, "events"), 1);
    assert_eq!(count(dest, "import_groups"), 1);
    assert_eq!(count(dest, "imported_pictures"), 1);
    assert_eq!(count(dest, "pictures"), 1);

    let (new_pid, new_gid, new_eid, name): (i64, i64, i64, String) = dest
        .query_row("SELECT pid, gid, eid, name FROM pictures", [], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })
        .unwrap();
    let dest_eid: i64 = dest
        .query_row("SELECT eid FROM events", [], |row| row.get(0))
        .unwrap();
    let dest_gid: i64 = dest
        .query_row("SELECT gid FROM import_groups", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "img1.lfp");
    assert_eq!(new_eid, dest_eid);
    assert_eq!(new_gid, dest_gid);

    assert!(libs.dest.image_path(new_gid, "img1.lfp").is_file());
    assert!(libs.dest.thumb_path(new_pid).is_file());
    libs.close();
}

#[test]
fn foreign_keys_are_rewritten_through_the_remap() {
    let tmp = TempDir::new().unwrap();
    let source_root = tmp.path().join("importing");
    let dest_root = tmp.path().join("main");

    let mut source = Library::create(&source_root).unwrap();
    let conn = source.conn().unwrap();
    let eid = add_event(conn, "trip");
    let gid = add_group(conn);
    add_imported(conn, "hashB");
    let pid = add_picture(conn, gid, eid, "img2.lfp");
    write_media(&source, gid, pid, "img2.lfp");
    source.close();

    // Pre-populate the destination so minted ids differ from source ids.
    let mut dest = Library::create(&dest_root).unwrap();
    let conn = dest.conn().unwrap();
    let old_eid1 = add_event(conn, "existing one");
    add_event(conn, "existing two");
    let old_gid = add_group(conn);
    add_picture(conn, old_gid, old_eid1, "old.lfp");
    dest.close();

    let mut libs = open_libraries(&source_root, &dest_root).unwrap();
    run_merge(&libs, &SilentProgress).unwrap();

    let dest = libs.dest.conn().unwrap();
    let (merged_gid, merged_eid): (i64, i64) = dest
        .query_row(
            "SELECT gid, eid FROM pictures WHERE name = 'img2.lfp'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    // The merged picture points at the freshly minted parents, not at the
    // source's ids (which collide with pre-existing destination rows).
    assert_eq!(merged_gid, old_gid + 1);
    assert_eq!(merged_eid, 3);
    libs.close();
}

#[test]
fn duplicate_pictures_cascade_and_leave_no_debris() {
    let tmp = TempDir::new().unwrap();
    let source_root = tmp.path().join("importing");
    let dest_root = tmp.path().join("main");

    let mut source = Library::create(&source_root).unwrap();
    let conn = source.conn().unwrap();
    let eid = add_event(conn, "trip");
    let gid = add_group(conn);
    add_imported(conn, "hashA");
    let pid = add_picture(conn, gid, eid, "img1.lfp");
    write_media(&source, gid, pid, "img1.lfp");
    source.close();

    // The destination has already imported this picture once.
    let mut dest = Library::create(&dest_root).unwrap();
    add_imported(dest.conn().unwrap(), "hashA");
    dest.close();

    let mut libs = open_libraries(&source_root, &dest_root).unwrap();
    let stats = run_merge(&libs, &SilentProgress).unwrap();

    assert_eq!(stats.duplicates_skipped, 1);
    assert_eq!(stats.pictures_merged, 0);
    assert_eq!(stats.files_copied, 0);
    assert_eq!(stats.empty_events_removed, 1);

    let dest = libs.dest.conn().unwrap();
    // The skipped picture's event was created and then cleaned up again;
    // the orphaned import group stays (only events are housekept).
    assert_eq!(count(dest, "events"), 0);
    assert_eq!(count(dest, "import_groups"), 1);
    assert_eq!(count(dest, "imported_pictures"), 1);
    assert_eq!(count(dest, "pictures"), 0);

    assert_eq!(entries(&libs.dest.thumbs_dir()), 0);
    assert_eq!(entries(&libs.dest.root().join("images")), 0);
    libs.close();
}

#[test]
fn dangling_event_reference_aborts_with_nothing_written() {
    let tmp = TempDir::new().unwrap();
    let source_root = tmp.path().join("importing");
    let dest_root = tmp.path().join("main");

    let mut source = Library::create(&source_root).unwrap();
    let conn = source.conn().unwrap();
    // This libsqlite3-sys build compiles in PRAGMA foreign_keys=ON by
    // default, so the deliberately-dangling source row below would be
    // rejected at insert time. Standard SQLite defaults this off (which is
    // why library.rs sets no pragmas); disable enforcement on the fixture
    // connection so a corrupt source library can be reproduced.
    conn.pragma_update(None, "foreign_keys", false).unwrap();
    let gid = add_group(conn);
    add_imported(conn, "hashA");
    // References event 99, which does not exist in the source library.
    let pid = add_picture(conn, gid, 99, "img1.lfp");
    write_media(&source, gid, pid, "img1.lfp");
    source.close();
    Library::create(&dest_root).unwrap().close();

    let mut libs = open_libraries(&source_root, &dest_root).unwrap();
    let err = run_merge(&libs, &SilentProgress).unwrap_err();
    assert!(matches!(
        err,
        MergeError::DanglingReference { column: "event", id: 99, .. }
    ));
    libs.close();

    // The transaction was abandoned: the destination database is as empty
    // as it started, and no file was ever touched.
    let dest = Connection::open(dest_root.join("library.db")).unwrap();
    assert_eq!(count(&dest, "events"), 0);
    assert_eq!(count(&dest, "import_groups"), 0);
    assert_eq!(count(&dest, "imported_pictures"), 0);
    assert_eq!(count(&dest, "pictures"), 0);
    assert_eq!(entries(&dest_root.join("thumbs")), 0);
    assert_eq!(entries(&dest_root.join("images")), 0);
}

#[test]
fn thumbnail_failure_rolls_back_files_and_database() {
    let tmp = TempDir::new().unwrap();
    let source_root = tmp.path().join("importing");
    let dest_root = tmp.path().join("main");

    let mut source = Library::create(&source_root).unwrap();
    let conn = source.conn().unwrap();
    let eid = add_event(conn, "trip");
    let gid = add_group(conn);
    add_imported(conn, "hashA");
    add_imported(conn, "hashB");
    let pid1 = add_picture(conn, gid, eid, "img1.lfp");
    let pid2 = add_picture(conn, gid, eid, "img2.lfp");
    write_media(&source, gid, pid1, "img1.lfp");
    // Picture 2 has its full image but no thumbnail, so the second copy
    // pass fails after three files have landed in the destination.
    fs::write(source.image_path(gid, "img2.lfp"), "image 2").unwrap();
    source.close();
    Library::create(&dest_root).unwrap().close();

    let mut libs = open_libraries(&source_root, &dest_root).unwrap();
    let err = run_merge(&libs, &SilentProgress).unwrap_err();
    assert!(matches!(err, MergeError::Copy { .. }));
    libs.close();

    // All three copied files and the group directory created for them are
    // gone again, and the database commit never happened.
    assert_eq!(entries(&dest_root.join("images")), 0);
    assert_eq!(entries(&dest_root.join("thumbs")), 0);
    let dest = Connection::open(dest_root.join("library.db")).unwrap();
    assert_eq!(count(&dest, "events"), 0);
    assert_eq!(count(&dest, "pictures"), 0);
}

// ── Engine-level properties ─────────────────────────────────────────────────

fn spec(name: &str) -> &'static lytro_merge_import::TableSpec {
    MERGE_ORDER.iter().find(|spec| spec.name == name).unwrap()
}

#[test]
fn remap_is_complete_and_minted_ids_are_unique() {
    let source = open_memory().unwrap();
    let events: Vec<i64> = (0..3).map(|n| add_event(&source, &format!("e{n}"))).collect();
    let groups: Vec<i64> = (0..2).map(|_| add_group(&source)).collect();
    add_imported(&source, "hashA");
    add_imported(&source, "hashB");
    add_picture(&source, groups[0], events[0], "a.lfp");
    add_picture(&source, groups[1], events[2], "b.lfp");

    let dest = open_memory().unwrap();
    let mut state = MergeState::default();
    for spec in &MERGE_ORDER {
        merge_table(&source, &dest, spec, &mut state).unwrap();
    }

    assert_eq!(state.remap.len("events"), 3);
    assert_eq!(state.remap.len("import_groups"), 2);
    assert_eq!(state.remap.len("imported_pictures"), 2);
    assert_eq!(state.remap.len("pictures"), 2);
    for old in events {
        assert!(state.remap.lookup_int("events", old).is_some());
    }
    // Minted ids are unique within the table.
    assert_eq!(state.remap.minted_ids("events").len(), 3);
    assert_eq!(state.remap.minted_ids("pictures").len(), 2);

    // And the text-keyed table preserved its ids verbatim.
    let hash = RowId::Text("hashA".to_string());
    assert_eq!(state.remap.lookup("imported_pictures", &hash), Some(&hash));
}

#[test]
fn duplicate_insert_records_the_source_row_index() {
    let source = open_memory().unwrap();
    add_imported(&source, "hashA");
    add_imported(&source, "hashB");
    add_imported(&source, "hashC");

    let dest = open_memory().unwrap();
    add_imported(&dest, "hashB");

    let mut state = MergeState::default();
    let stats = merge_table(&source, &dest, spec("imported_pictures"), &mut state).unwrap();

    assert_eq!(stats.created, 2);
    assert_eq!(stats.skipped, 1);
    assert!(state.duplicates.contains(1));
    assert!(!state.duplicates.contains(0));
    assert!(!state.duplicates.contains(2));
    // Duplicates never reach the remap.
    assert_eq!(state.remap.len("imported_pictures"), 2);
}

#[test]
fn skipped_pictures_produce_no_record_and_no_row() {
    let source = open_memory().unwrap();
    let eid = add_event(&source, "trip");
    let gid = add_group(&source);
    add_imported(&source, "hashA");
    add_imported(&source, "hashB");
    add_picture(&source, gid, eid, "dup.lfp");
    add_picture(&source, gid, eid, "new.lfp");

    let dest = open_memory().unwrap();
    add_imported(&dest, "hashA");

    let mut state = MergeState::default();
    for spec in &MERGE_ORDER {
        merge_table(&source, &dest, spec, &mut state).unwrap();
    }

    assert_eq!(count(&dest, "pictures"), 1);
    assert_eq!(state.pictures.len(), 1);
    assert_eq!(state.pictures[0].name, "new.lfp");
}

#[test]
fn schema_mismatch_is_fatal() {
    let source = Connection::open_in_memory().unwrap();
    source
        .execute_batch("CREATE TABLE events (eid INTEGER PRIMARY KEY, name TEXT);")
        .unwrap();
    let dest = open_memory().unwrap();

    let mut state = MergeState::default();
    let err = merge_table(&source, &dest, spec("events"), &mut state).unwrap_err();
    assert!(matches!(
        err,
        MergeError::SchemaMismatch { table: "events", expected: 5, found: 2 }
    ));
}

// ── Housekeeping ────────────────────────────────────────────────────────────

#[test]
fn housekeeping_only_touches_events_minted_this_run() {
    let dest = open_memory().unwrap();
    let preexisting = add_event(&dest, "old and empty");

    let mut remap = IdRemap::default();
    let minted_empty = add_event(&dest, "new and empty");
    remap.record("events", RowId::Int(10), RowId::Int(minted_empty));
    let minted_kept = add_event(&dest, "new with picture");
    remap.record("events", RowId::Int(11), RowId::Int(minted_kept));
    let gid = add_group(&dest);
    add_picture(&dest, gid, minted_kept, "img.lfp");

    let deleted = delete_empty_events(&dest, &remap).unwrap();
    assert_eq!(deleted, 1);

    let remaining: Vec<i64> = dest
        .prepare("SELECT eid FROM events ORDER BY eid")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(remaining, vec![preexisting, minted_kept]);

    // A second pass finds nothing left to delete.
    assert_eq!(delete_empty_events(&dest, &remap).unwrap(), 0);
}
