//! Movies-directory scanner.
//!
//! Lists the immediate children of the configured movies folder, keeps the
//! sub-directories, and derives one [`MovieRecord`] per folder whose name
//! yields a usable title.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::naming;

/// One movie folder with its derived title. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRecord {
    pub original_folder_name: String,
    pub clean_name: String,
    pub folder_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("movies folder not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("permission denied reading movies folder: {}", .0.display())]
    AccessDenied(PathBuf),
    #[error("failed to read movies folder: {0}")]
    Io(#[from] std::io::Error),
}

/// Scans `root` and returns records in directory-listing order.
///
/// Fails only on root-level problems (missing folder, permission, read
/// error); per-entry failures are logged and skipped so one bad entry never
/// hides the rest of the batch.
pub fn scan_movie_folders(root: &Path) -> Result<Vec<MovieRecord>, ScanError> {
    if !root.exists() {
        return Err(ScanError::NotFound(root.to_path_buf()));
    }

    let entries = fs::read_dir(root).map_err(|error| match error.kind() {
        ErrorKind::NotFound => ScanError::NotFound(root.to_path_buf()),
        ErrorKind::PermissionDenied => ScanError::AccessDenied(root.to_path_buf()),
        _ => ScanError::Io(error),
    })?;

    let mut records = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Failed to read a directory entry in {}: {}", root.display(), err);
                continue;
            }
        };

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => {
                debug!("Failed to inspect {}: {}", entry.path().display(), err);
                continue;
            }
        };
        if !file_type.is_dir() {
            continue;
        }

        let original_folder_name = entry.file_name().to_string_lossy().to_string();
        let clean_name = naming::clean_title(&original_folder_name);
        if clean_name.is_empty() {
            debug!("Skipping '{original_folder_name}': no usable title");
            continue;
        }
        if let Some(marker) =
            naming::parenthetical_title(&original_folder_name).and_then(|m| m.recognized_marker)
        {
            debug!("Folder '{original_folder_name}' names release format '{marker}'");
        }

        info!("Extracted: '{clean_name}' from '{original_folder_name}'");
        records.push(MovieRecord {
            original_folder_name,
            clean_name,
            folder_path: entry.path(),
        });
    }

    info!(
        "Successfully extracted {} movie names from {}",
        records.len(),
        root.display()
    );
    Ok(records)
}
