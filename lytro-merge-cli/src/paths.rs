//! Main-library discovery and the console fallback prompt.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::error::CliError;

/// Locate the main Lytro library the desktop application uses.
///
/// Windows keeps it under `%LOCALAPPDATA%\Lytro`, macOS under
/// `~/Pictures/Lytro.lytrolib`. The desktop application never shipped for
/// other platforms, so there the caller must pass `--main-library`.
pub(crate) fn default_main_library() -> Result<PathBuf, CliError> {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|dir| dir.join("Lytro"))
            .ok_or(CliError::NoMainLibrary)
    } else if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|dir| dir.join("Pictures").join("Lytro.lytrolib"))
            .ok_or(CliError::NoMainLibrary)
    } else {
        Err(CliError::NoMainLibrary)
    }
}

/// Ask for the importing library path on the console.
pub(crate) fn prompt_for_library() -> Result<PathBuf, CliError> {
    println!("Please enter the path to the importing library folder.");
    print!("PATH> ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let path = line.trim();
    if path.is_empty() {
        return Err(CliError::NoImportingLibrary);
    }
    Ok(PathBuf::from(path))
}
