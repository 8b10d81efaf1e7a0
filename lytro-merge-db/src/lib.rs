//! SQLite persistence layer for Lytro photo libraries.
//!
//! Provides the on-disk library model (one `library.db` database plus two
//! media subdirectories), connection management for a merge run, and the
//! reference schema, backed by SQLite (via rusqlite with bundled feature).

pub mod library;
pub mod schema;

pub use library::{
    DB_FILENAME, IMAGES_DIR, Library, LibraryError, LibraryPair, THUMBS_DIR, open_libraries,
};
pub use schema::{SchemaError, create_schema, open_memory};
