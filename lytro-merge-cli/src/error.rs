use thiserror::Error;

/// Errors that can occur during a merge run.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Library open/validation failed
    #[error("{0}")]
    Library(#[from] lytro_merge_db::LibraryError),

    /// The merge itself failed
    #[error("{0}")]
    Merge(#[from] lytro_merge_import::MergeError),

    /// No per-platform main library location is known
    #[error("Cannot locate the main Lytro library on this platform; pass --main-library")]
    NoMainLibrary,

    /// Empty response to the interactive prompt
    #[error("No importing library given")]
    NoImportingLibrary,
}
