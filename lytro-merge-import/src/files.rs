//! Picture file migration with rollback bookkeeping.
//!
//! The filesystem has no transactional undo, so every destination path is
//! recorded before it is touched. On failure the log is replayed (files
//! first, then directories, in creation order), deleting whatever this
//! run managed to create.

use std::fs;
use std::path::{Path, PathBuf};

use lytro_merge_db::Library;

use crate::progress::MergeProgress;
use crate::table_merge::MergeError;

/// Everything the file migrator needs to know about one merged picture:
/// old ids to locate the source files, new ids to place the destination
/// files. Lives only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureRecord {
    pub pid: i64,
    pub gid: i64,
    pub eid: i64,
    pub name: String,
    pub new_pid: i64,
    pub new_gid: i64,
    pub new_eid: i64,
}

/// Destination files and directories created so far, in creation order.
#[derive(Debug, Default)]
struct RollbackLog {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl RollbackLog {
    /// Record a destination file before its copy is attempted, so a
    /// partially written file is removed too.
    fn record_file(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    /// Record a group directory. Directories are recorded even when they
    /// already existed: deleting a non-empty directory fails and is
    /// tolerated below, so over-recording cannot destroy prior content.
    fn record_dir(&mut self, path: PathBuf) {
        if !self.dirs.contains(&path) {
            self.dirs.push(path);
        }
    }

    /// Best-effort deletion of everything recorded. Individual failures
    /// are logged and skipped; this never fails the run.
    fn undo(&self) {
        log::debug!("Deleting copied files...");
        for file in &self.files {
            log::info!("    Deleting file ({})", file.display());
            if let Err(e) = fs::remove_file(file) {
                log::error!("    Cannot delete file {}: {}", file.display(), e);
            }
        }
        for dir in &self.dirs {
            log::info!("    Deleting folder ({})", dir.display());
            if let Err(e) = fs::remove_dir(dir) {
                log::error!("    Cannot delete folder {}: {}", dir.display(), e);
            }
        }
    }
}

/// Copy the full image and the thumbnail of every merged picture.
///
/// Full images are copied in one pass and thumbnails in a second, so a
/// failure partway through thumbnails still has every full image in
/// place; all of one asset type beats a partial mix. Any copy failure
/// deletes everything created by this run and then propagates.
///
/// Returns the number of files copied.
pub fn copy_picture_files(
    source: &Library,
    dest: &Library,
    pictures: &[PictureRecord],
    progress: &dyn MergeProgress,
) -> Result<u64, MergeError> {
    let mut rollback = RollbackLog::default();
    match copy_all(source, dest, pictures, &mut rollback, progress) {
        Ok(copied) => Ok(copied),
        Err(e) => {
            log::warn!("Faced an error, deleting all copied files...");
            rollback.undo();
            Err(e)
        }
    }
}

fn copy_all(
    source: &Library,
    dest: &Library,
    pictures: &[PictureRecord],
    rollback: &mut RollbackLog,
    progress: &dyn MergeProgress,
) -> Result<u64, MergeError> {
    let total = pictures.len() * 2;
    let mut copied = 0u64;

    log::debug!("Copying light-field files...");
    for pic in pictures {
        let from = source.image_path(pic.gid, &pic.name);
        let to_dir = dest.image_dir(pic.new_gid);
        let to = dest.image_path(pic.new_gid, &pic.name);

        rollback.record_dir(to_dir.clone());
        if !to_dir.exists() {
            fs::create_dir_all(&to_dir).map_err(|e| MergeError::CreateDir {
                path: to_dir.clone(),
                source: e,
            })?;
        }

        progress.on_file(copied as usize + 1, total, &pic.name);
        log::info!(
            "    Copying image file ({}, {} -> {})",
            pic.pid,
            from.display(),
            to.display()
        );
        copy_file(&from, &to, rollback)?;
        copied += 1;
    }

    log::debug!("Copying thumbnail files...");
    for pic in pictures {
        let from = source.thumb_path(pic.pid);
        let to = dest.thumb_path(pic.new_pid);

        progress.on_file(copied as usize + 1, total, &pic.name);
        log::info!(
            "    Copying thumbnail file ({}, {} -> {})",
            pic.pid,
            from.display(),
            to.display()
        );
        copy_file(&from, &to, rollback)?;
        copied += 1;
    }

    Ok(copied)
}

fn copy_file(from: &Path, to: &Path, rollback: &mut RollbackLog) -> Result<(), MergeError> {
    rollback.record_file(to.to_path_buf());
    fs::copy(from, to).map_err(|e| MergeError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
