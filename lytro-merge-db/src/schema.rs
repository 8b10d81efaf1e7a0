//! Reference schema for a Lytro `library.db`.
//!
//! The merge engine only ever reads and writes the four tables below. A
//! library created by the desktop application already has them; fixtures
//! and freshly initialized libraries get them from [`create_schema`].

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Create the four library tables if they don't exist.
///
/// This is idempotent — safe to call on an existing database.
pub fn create_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Open an in-memory database with the full library schema. Useful for testing.
pub fn open_memory() -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    create_schema(&conn)?;
    Ok(conn)
}

const SCHEMA_SQL: &str = r#"
-- Albums the desktop application groups pictures under
CREATE TABLE IF NOT EXISTS events (
    eid INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    date_created TEXT,
    date_modified TEXT
);

-- One row per camera import session
CREATE TABLE IF NOT EXISTS import_groups (
    gid INTEGER PRIMARY KEY AUTOINCREMENT
);

-- Content hashes of every picture ever imported. The primary key doubles
-- as the uniqueness constraint the merge relies on to detect duplicates.
CREATE TABLE IF NOT EXISTS imported_pictures (
    picture_hash TEXT PRIMARY KEY
);

-- Light-field pictures
CREATE TABLE IF NOT EXISTS pictures (
    pid INTEGER PRIMARY KEY AUTOINCREMENT,
    gid INTEGER NOT NULL REFERENCES import_groups(gid),
    eid INTEGER NOT NULL REFERENCES events(eid),
    name TEXT NOT NULL,
    picture_hash TEXT,
    date_taken TEXT,
    date_imported TEXT,
    width INTEGER,
    height INTEGER,
    orientation INTEGER,
    stars INTEGER,
    caption TEXT,
    is_hidden INTEGER NOT NULL DEFAULT 0,
    focus_min REAL,
    focus_max REAL,
    serial_number TEXT,
    last_exported TEXT
);
CREATE INDEX IF NOT EXISTS idx_pictures_eid ON pictures(eid);
CREATE INDEX IF NOT EXISTS idx_pictures_gid ON pictures(gid);
"#;
