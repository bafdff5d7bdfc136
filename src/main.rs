mod config;
mod folder_icon;
mod icon;
mod naming;
mod pipeline;
mod poster;
mod scanner;

use std::path::PathBuf;

use log::{error, info};

use folder_icon::ShellIconApplier;
use pipeline::{IconPipeline, LogProgress};
use poster::PosterScraper;

fn main() {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    let config_path = config::config_file_path();
    let config = config::load_config(&config_path);

    let movies_folder = PathBuf::from(&config.library.movies_folder);
    let records = match scanner::scan_movie_folders(&movies_folder) {
        Ok(records) => records,
        Err(err) => {
            error!("{err}");
            Vec::new()
        }
    };
    if records.is_empty() {
        error!("No movies found to process");
        return;
    }

    let provider = PosterScraper::new(&config.fetch);
    let mut pipeline = match IconPipeline::new(
        provider,
        ShellIconApplier,
        LogProgress,
        PathBuf::from(&config.library.icons_folder),
        config.fetch.pause_between_titles(),
    ) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!(
                "Failed to create icons folder '{}': {err}",
                config.library.icons_folder
            );
            return;
        }
    };

    info!("Starting movie icon processing...");
    pipeline.run(&records);
}
