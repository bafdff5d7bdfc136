//! Standalone movie-title export tool.
//!
//! Deliberately a simplified inline rendition of the scanner: only the
//! parenthetical rule runs here, and folders carrying the `of10` rating
//! marker are skipped outright rather than stripped. Titles are written
//! deduplicated and sorted, one per line.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{error, info};

const CONFIG_FILE_NAME: &str = "movico.toml";
const RATING_MARKER: &str = "of10";

#[derive(Default, serde::Deserialize)]
struct ExporterConfig {
    #[serde(default)]
    library: LibrarySection,
    #[serde(default)]
    export: ExportSection,
}

#[derive(serde::Deserialize)]
struct LibrarySection {
    #[serde(default = "default_movies_folder")]
    movies_folder: String,
}

#[derive(serde::Deserialize)]
struct ExportSection {
    #[serde(default = "default_output_file")]
    output_file: String,
}

impl Default for LibrarySection {
    fn default() -> Self {
        Self {
            movies_folder: default_movies_folder(),
        }
    }
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            output_file: default_output_file(),
        }
    }
}

fn default_movies_folder() -> String {
    "Movies".to_string()
}

fn default_output_file() -> String {
    "movies.txt".to_string()
}

fn load_config() -> ExporterConfig {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    let path = if local.exists() {
        local
    } else {
        dirs::config_dir()
            .map(|dir| dir.join("movico").join(CONFIG_FILE_NAME))
            .unwrap_or(local)
    };
    fs::read_to_string(&path)
        .ok()
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Title before the first complete parenthesized segment; names without one
/// pass through trimmed. `None` means the folder has no usable title.
fn exported_title(folder_name: &str) -> Option<String> {
    let title = match folder_name.find('(') {
        Some(open) if open > 0 && folder_name[open..].contains(')') => folder_name[..open].trim(),
        _ => folder_name.trim(),
    };
    (!title.is_empty()).then(|| title.to_string())
}

fn collect_titles(movies_folder: &Path) -> Option<BTreeSet<String>> {
    if !movies_folder.exists() {
        error!("Folder '{}' does not exist.", movies_folder.display());
        return None;
    }

    let entries = match fs::read_dir(movies_folder) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::PermissionDenied => {
            error!(
                "Permission denied to access folder '{}'.",
                movies_folder.display()
            );
            return None;
        }
        Err(err) => {
            error!("Cannot read folder '{}': {err}", movies_folder.display());
            return None;
        }
    };

    let mut titles = BTreeSet::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        // Rated folders are skipped here, not stripped like the icon tool does.
        if name.to_ascii_lowercase().contains(RATING_MARKER) {
            continue;
        }
        if let Some(title) = exported_title(&name) {
            titles.insert(title);
        }
    }
    Some(titles)
}

fn export_titles(movies_folder: &Path, output_file: &Path) {
    let Some(titles) = collect_titles(movies_folder) else {
        return;
    };

    let mut contents = String::new();
    for title in &titles {
        contents.push_str(title);
        contents.push('\n');
    }

    if let Err(err) = fs::write(output_file, contents) {
        error!("Error writing to '{}': {err}", output_file.display());
        return;
    }

    info!(
        "Successfully extracted {} movie names to '{}'",
        titles.len(),
        output_file.display()
    );
}

fn main() {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    let config = load_config();
    export_titles(
        Path::new(&config.library.movies_folder),
        Path::new(&config.export.output_file),
    );
}
