//! Application configuration model and defaults.
//!
//! Both binaries read the same `movico.toml`; every key is optional and falls
//! back to a built-in default, so a missing or partial file is never fatal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;

pub const CONFIG_FILE_NAME: &str = "movico.toml";

/// Root configuration read from `movico.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct Config {
    /// Movie library locations.
    #[serde(default)]
    pub library: LibraryConfig,
    /// Network timeouts and pacing.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Title-export output preferences.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Movie library locations.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct LibraryConfig {
    /// Folder whose immediate sub-directories are the movie folders.
    #[serde(default = "default_movies_folder")]
    pub movies_folder: String,
    /// Folder that receives downloaded posters and generated icons.
    #[serde(default = "default_icons_folder")]
    pub icons_folder: String,
}

/// Network timeouts and pacing.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Fixed pause between processed titles. Bounds the request rate against
    /// the search service; not a backoff policy.
    #[serde(default = "default_pause_between_titles_secs")]
    pub pause_between_titles_secs: u64,
}

/// Title-export output preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_file")]
    pub output_file: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            movies_folder: default_movies_folder(),
            icons_folder: default_icons_folder(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: default_search_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            pause_between_titles_secs: default_pause_between_titles_secs(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_file: default_output_file(),
        }
    }
}

impl FetchConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn pause_between_titles(&self) -> Duration {
        Duration::from_secs(self.pause_between_titles_secs)
    }
}

fn default_movies_folder() -> String {
    "Movies".to_string()
}

fn default_icons_folder() -> String {
    "movie_icons".to_string()
}

fn default_search_timeout_secs() -> u64 {
    10
}

fn default_download_timeout_secs() -> u64 {
    30
}

fn default_pause_between_titles_secs() -> u64 {
    1
}

fn default_output_file() -> String {
    "movies.txt".to_string()
}

/// Resolves the config file location: `movico.toml` in the working directory
/// when present, otherwise the per-user config directory.
pub fn config_file_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("movico").join(CONFIG_FILE_NAME))
        .unwrap_or(local)
}

/// Loads the config file, falling back to defaults on any read or parse
/// failure.
pub fn load_config(path: &Path) -> Config {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(
                "Failed to read config file {}. Using defaults. error={}",
                path.display(),
                err
            );
            return Config::default();
        }
    };

    match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!(
                "Failed to parse config file {}. Using defaults. error={}",
                path.display(),
                err
            );
            Config::default()
        }
    }
}
