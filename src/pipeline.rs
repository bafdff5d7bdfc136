//! Batch icon pipeline.
//!
//! Each record runs resolve → download → convert → apply and stops at the
//! first failing stage; a failed record never stops the batch. A fixed pause
//! separates records to bound the request rate against the search service.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::folder_icon::IconApplier;
use crate::icon;
use crate::naming;
use crate::poster::PosterProvider;
use crate::scanner::MovieRecord;

/// Stages a record passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Download,
    Convert,
    Apply,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Resolve => "resolve",
            Self::Download => "download",
            Self::Convert => "convert",
            Self::Apply => "apply",
        })
    }
}

/// Batch outcome counters, reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
}

/// Per-record event sink.
///
/// The pipeline reports every outcome here so callers (and tests) observe the
/// run deterministically; [`LogProgress`] is the production sink.
pub trait ProgressObserver {
    fn record_started(&mut self, _record: &MovieRecord) {}
    fn stage_failed(&mut self, record: &MovieRecord, stage: Stage, reason: &str);
    fn record_succeeded(&mut self, record: &MovieRecord);
}

/// Forwards pipeline events to the log.
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn record_started(&mut self, record: &MovieRecord) {
        info!("Processing: {}", record.clean_name);
    }

    fn stage_failed(&mut self, record: &MovieRecord, stage: Stage, reason: &str) {
        warn!("'{}' failed at {stage}: {reason}", record.clean_name);
    }

    fn record_succeeded(&mut self, record: &MovieRecord) {
        info!("Finished '{}'", record.clean_name);
    }
}

struct StageFailure {
    stage: Stage,
    reason: String,
}

impl StageFailure {
    fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Orchestrates one batch over the scanned records.
pub struct IconPipeline<P, A, O> {
    provider: P,
    applier: A,
    observer: O,
    icons_folder: PathBuf,
    pause_between_records: Duration,
}

impl<P, A, O> IconPipeline<P, A, O>
where
    P: PosterProvider,
    A: IconApplier,
    O: ProgressObserver,
{
    /// Creates the pipeline and its icons output folder.
    pub fn new(
        provider: P,
        applier: A,
        observer: O,
        icons_folder: PathBuf,
        pause_between_records: Duration,
    ) -> std::io::Result<Self> {
        fs::create_dir_all(&icons_folder)?;
        Ok(Self {
            provider,
            applier,
            observer,
            icons_folder,
            pause_between_records,
        })
    }

    /// Processes every record in order and returns the summary. Pauses after
    /// each record, success or failure alike.
    pub fn run(&mut self, records: &[MovieRecord]) -> RunSummary {
        let mut summary = RunSummary::default();
        for record in records {
            summary.total += 1;
            self.observer.record_started(record);
            match self.process_record(record) {
                Ok(()) => {
                    summary.succeeded += 1;
                    self.observer.record_succeeded(record);
                }
                Err(failure) => {
                    self.observer
                        .stage_failed(record, failure.stage, &failure.reason);
                }
            }
            thread::sleep(self.pause_between_records);
        }

        info!(
            "Successfully processed {} out of {} movies",
            summary.succeeded, summary.total
        );
        summary
    }

    fn process_record(&self, record: &MovieRecord) -> Result<(), StageFailure> {
        let poster_url = self
            .provider
            .resolve(&record.clean_name)
            .ok_or_else(|| StageFailure::new(Stage::Resolve, "no poster URL resolved"))?;

        let stem = naming::safe_file_stem(&record.clean_name);
        let image_path = self.icons_folder.join(format!("{stem}.jpg"));
        let icon_path = self.icons_folder.join(format!("{stem}.ico"));

        let bytes = self
            .provider
            .download(&poster_url)
            .map_err(|err| StageFailure::new(Stage::Download, err.to_string()))?;
        fs::write(&image_path, &bytes).map_err(|err| {
            StageFailure::new(
                Stage::Download,
                format!("failed to write {}: {err}", image_path.display()),
            )
        })?;

        icon::convert_to_icon(&image_path, &icon_path)
            .map_err(|err| StageFailure::new(Stage::Convert, err.to_string()))?;

        self.applier
            .apply(&record.folder_path, &icon_path)
            .map_err(|err| StageFailure::new(Stage::Apply, err.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;
    use std::time::Duration;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::{IconPipeline, ProgressObserver, RunSummary, Stage};
    use crate::folder_icon::{ApplyError, IconApplier};
    use crate::poster::{FetchError, PosterProvider};
    use crate::scanner::MovieRecord;

    /// Resolves every title except `"Missing"` to one stub URL and serves the
    /// same poster bytes for it.
    struct StubProvider {
        poster_bytes: Vec<u8>,
    }

    impl PosterProvider for StubProvider {
        fn resolve(&self, title: &str) -> Option<String> {
            if title == "Missing" {
                return None;
            }
            Some("https://m.media-amazon.com/images/M/stub._V1_SX300.jpg".to_string())
        }

        fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            if self.poster_bytes.is_empty() {
                return Err(FetchError::EmptyBody {
                    url: url.to_string(),
                });
            }
            Ok(self.poster_bytes.clone())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingApplier {
        applied: Rc<RefCell<Vec<(PathBuf, PathBuf)>>>,
    }

    impl IconApplier for RecordingApplier {
        fn apply(&self, folder: &Path, icon: &Path) -> Result<(), ApplyError> {
            self.applied
                .borrow_mut()
                .push((folder.to_path_buf(), icon.to_path_buf()));
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CollectingObserver {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl ProgressObserver for CollectingObserver {
        fn record_started(&mut self, record: &MovieRecord) {
            self.events
                .borrow_mut()
                .push(format!("started {}", record.clean_name));
        }

        fn stage_failed(&mut self, record: &MovieRecord, stage: Stage, _reason: &str) {
            self.events
                .borrow_mut()
                .push(format!("failed {} at {stage}", record.clean_name));
        }

        fn record_succeeded(&mut self, record: &MovieRecord) {
            self.events
                .borrow_mut()
                .push(format!("succeeded {}", record.clean_name));
        }
    }

    fn record(clean_name: &str, folder: &Path) -> MovieRecord {
        MovieRecord {
            original_folder_name: clean_name.to_string(),
            clean_name: clean_name.to_string(),
            folder_path: folder.join(clean_name),
        }
    }

    fn poster_png() -> Vec<u8> {
        let poster = RgbaImage::from_pixel(190, 281, Rgba([40, 90, 160, 255]));
        let mut bytes = Cursor::new(Vec::new());
        poster.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_resolve_failure_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let applier = RecordingApplier::default();
        let observer = CollectingObserver::default();
        let events = observer.events.clone();

        let mut pipeline = IconPipeline::new(
            StubProvider {
                poster_bytes: poster_png(),
            },
            applier.clone(),
            observer,
            dir.path().join("icons"),
            Duration::ZERO,
        )
        .unwrap();

        let records = [record("Missing", dir.path()), record("Inception", dir.path())];
        let summary = pipeline.run(&records);

        assert_eq!(
            summary,
            RunSummary {
                total: 2,
                succeeded: 1
            }
        );
        assert_eq!(
            events.borrow().as_slice(),
            [
                "started Missing",
                "failed Missing at resolve",
                "started Inception",
                "succeeded Inception",
            ]
        );
        assert_eq!(applier.applied.borrow().len(), 1);
    }

    #[test]
    fn test_success_path_produces_and_applies_icon() {
        let dir = tempfile::tempdir().unwrap();
        let icons_folder = dir.path().join("icons");
        let applier = RecordingApplier::default();

        let mut pipeline = IconPipeline::new(
            StubProvider {
                poster_bytes: poster_png(),
            },
            applier.clone(),
            CollectingObserver::default(),
            icons_folder.clone(),
            Duration::ZERO,
        )
        .unwrap();

        let records = [record("Mad Max: Fury Road", dir.path())];
        let summary = pipeline.run(&records);
        assert_eq!(summary.succeeded, 1);

        // Illegal filename characters are replaced in the artifact names.
        let icon_path = icons_folder.join("Mad Max_ Fury Road.ico");
        assert!(icons_folder.join("Mad Max_ Fury Road.jpg").exists());
        let decoded = image::open(&icon_path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (256, 256));

        let applied = applier.applied.borrow();
        assert_eq!(
            applied.as_slice(),
            [(dir.path().join("Mad Max: Fury Road"), icon_path)]
        );
    }

    #[test]
    fn test_download_failure_is_reported_at_download_stage() {
        let dir = tempfile::tempdir().unwrap();
        let observer = CollectingObserver::default();
        let events = observer.events.clone();

        let mut pipeline = IconPipeline::new(
            StubProvider {
                poster_bytes: Vec::new(),
            },
            RecordingApplier::default(),
            observer,
            dir.path().join("icons"),
            Duration::ZERO,
        )
        .unwrap();

        let summary = pipeline.run(&[record("Inception", dir.path())]);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(
            events.borrow().as_slice(),
            ["started Inception", "failed Inception at download"]
        );
    }

    #[test]
    fn test_undecodable_poster_fails_at_convert() {
        let dir = tempfile::tempdir().unwrap();
        let observer = CollectingObserver::default();
        let events = observer.events.clone();

        let mut pipeline = IconPipeline::new(
            StubProvider {
                poster_bytes: b"not an image at all".to_vec(),
            },
            RecordingApplier::default(),
            observer,
            dir.path().join("icons"),
            Duration::ZERO,
        )
        .unwrap();

        let summary = pipeline.run(&[record("Inception", dir.path())]);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(
            events.borrow().as_slice(),
            ["started Inception", "failed Inception at convert"]
        );
    }
}
