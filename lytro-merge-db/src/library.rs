//! On-disk library model and connection management.
//!
//! A Lytro library is a directory holding a `library.db` SQLite database
//! and two media subdirectories: `images/` for the full light-field files
//! and `thumbs/` for thumbnail JPEGs. A merge run opens two of them: the
//! importing (source) library and the user's main (destination) library.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use thiserror::Error;

use crate::schema::{SchemaError, create_schema};

/// Database filename inside a library root.
pub const DB_FILENAME: &str = "library.db";
/// Subdirectory holding full-resolution light-field files.
pub const IMAGES_DIR: &str = "images";
/// Subdirectory holding thumbnail JPEGs.
pub const THUMBS_DIR: &str = "thumbs";

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Not a library: {root} ({reason})")]
    NotALibrary { root: PathBuf, reason: String },
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Library already closed: {}", .0.display())]
    Closed(PathBuf),
}

/// One open photo library.
#[derive(Debug)]
pub struct Library {
    root: PathBuf,
    conn: Option<Connection>,
}

impl Library {
    /// Open an existing library, validating the directory layout first.
    ///
    /// The directory must exist and contain a `library.db` file. No
    /// pragmas are set on the connection: the database file must come
    /// back byte-for-byte unchanged from a failed run, and a journal-mode
    /// switch alone would already mutate it.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(LibraryError::NotALibrary {
                root,
                reason: "no such directory".to_string(),
            });
        }
        let db = root.join(DB_FILENAME);
        if !db.is_file() {
            return Err(LibraryError::NotALibrary {
                root,
                reason: format!("missing {DB_FILENAME}"),
            });
        }

        log::debug!("Opening library... ({})", root.display());
        let conn = Connection::open(&db)?;
        conn.busy_timeout(Duration::from_secs(2))?;
        Ok(Self {
            root,
            conn: Some(conn),
        })
    }

    /// Create a fresh, empty library at `root`: both media subdirectories
    /// plus a schema-initialized `library.db`.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let root = root.into();
        fs::create_dir_all(root.join(IMAGES_DIR))?;
        fs::create_dir_all(root.join(THUMBS_DIR))?;
        let conn = Connection::open(root.join(DB_FILENAME))?;
        create_schema(&conn)?;
        Ok(Self {
            root,
            conn: Some(conn),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The open connection, or an error if the library was closed.
    pub fn conn(&self) -> Result<&Connection, LibraryError> {
        self.conn
            .as_ref()
            .ok_or_else(|| LibraryError::Closed(self.root.clone()))
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(DB_FILENAME)
    }

    /// Directory holding the full light-field files of one import group.
    pub fn image_dir(&self, gid: i64) -> PathBuf {
        self.root.join(IMAGES_DIR).join(format!("{gid:02x}"))
    }

    /// Full light-field file path for a picture in the given group.
    pub fn image_path(&self, gid: i64, name: &str) -> PathBuf {
        self.image_dir(gid).join(name)
    }

    pub fn thumbs_dir(&self) -> PathBuf {
        self.root.join(THUMBS_DIR)
    }

    /// Thumbnail path for a picture id.
    pub fn thumb_path(&self, pid: i64) -> PathBuf {
        self.thumbs_dir().join(format!("pic_{pid:05}_lo.jpg"))
    }

    /// Close the connection. Idempotent; failures are logged, not returned.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => log::debug!("Library closed. ({})", self.root.display()),
                Err((_conn, e)) => {
                    log::warn!("Cannot close library at {}: {}", self.root.display(), e);
                }
            }
        }
    }
}

/// The source/destination pair of one merge run.
#[derive(Debug)]
pub struct LibraryPair {
    pub source: Library,
    pub dest: Library,
}

impl LibraryPair {
    /// Close both libraries. Idempotent, always safe to call.
    pub fn close(&mut self) {
        self.dest.close();
        self.source.close();
    }
}

/// Open the importing (source) and main (destination) libraries.
///
/// The source is validated first; the destination is never touched until
/// the source has opened successfully.
pub fn open_libraries(
    source_root: impl Into<PathBuf>,
    dest_root: impl Into<PathBuf>,
) -> Result<LibraryPair, LibraryError> {
    let source = Library::open(source_root)?;
    let dest = Library::open(dest_root)?;
    Ok(LibraryPair { source, dest })
}
