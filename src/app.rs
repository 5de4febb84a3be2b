/// Batch orchestration
///
/// Runs analyze, render and write for each discovered file in turn. This is the
/// one place that treats per-file failures as non-fatal; presentation hooks in
/// through a [`ScanObserver`] passed by the caller.

use std::path::{Path, PathBuf};

use log::{error, info};
use serde::Serialize;

use crate::config::ScanConfig;
use crate::core::analyzer::ShapeAnalyzer;
use crate::core::discovery::Discovery;
use crate::error::{CsvHeroError, Result};
use crate::utils::file_utils::readme_path_for;
use crate::utils::output_formatter::{format_shape_markdown, write_readme};
use crate::VERSION;

/// What happened to one source file
#[derive(Debug)]
pub enum FileOutcome {
    /// Companion document written
    Written { rows: u64, dest: PathBuf },
    /// Companion document already existed and was left alone
    Skipped { rows: u64, dest: PathBuf },
    /// Reading, parsing or writing failed; `rows` is set when only the write failed
    Failed {
        rows: Option<u64>,
        error: CsvHeroError,
    },
}

/// Totals for a finished scan
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub files_seen: usize,
    /// Rows across every file that was analyzed, whatever happened to its document
    pub total_rows: u64,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ScanSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        self.files_seen += 1;
        match outcome {
            FileOutcome::Written { rows, .. } => {
                self.written += 1;
                self.total_rows += rows;
            }
            FileOutcome::Skipped { rows, .. } => {
                self.skipped += 1;
                self.total_rows += rows;
            }
            FileOutcome::Failed { rows, .. } => {
                self.failed += 1;
                self.total_rows += rows.unwrap_or(0);
            }
        }
    }
}

/// Presentation hooks called between files, never during one
pub trait ScanObserver {
    /// Called once before the first file, with the file count when it is known
    fn on_start(&mut self, _expected: Option<usize>) {}

    /// Called after each file has been fully processed
    fn on_file(&mut self, _path: &Path, _outcome: &FileOutcome) {}

    /// Called once after the last file
    fn on_finish(&mut self, _summary: &ScanSummary) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct Silent;

impl ScanObserver for Silent {}

/// Analyze one file and write its companion document
pub fn process_file(path: &Path, analyzer: &ShapeAnalyzer, overwrite: bool) -> FileOutcome {
    let profile = match analyzer.analyze_file(path) {
        Ok(profile) => profile,
        Err(error) => return FileOutcome::Failed { rows: None, error },
    };

    let markdown = format_shape_markdown(&profile, VERSION);
    let dest = readme_path_for(path);
    let rows = profile.row_count();

    match write_readme(&markdown, &dest, overwrite) {
        Ok(()) => FileOutcome::Written { rows, dest },
        Err(e) if e.is_skip() => FileOutcome::Skipped { rows, dest },
        Err(error) => FileOutcome::Failed {
            rows: Some(rows),
            error,
        },
    }
}

/// Process every path in order, reporting through `observer`
///
/// Per-file failures are logged and counted; they never stop the batch.
pub fn run_scan<I>(paths: I, config: &ScanConfig, observer: &mut dyn ScanObserver) -> ScanSummary
where
    I: IntoIterator<Item = PathBuf>,
{
    let paths = paths.into_iter();
    let expected = match paths.size_hint() {
        (lower, Some(upper)) if lower == upper => Some(lower),
        _ => None,
    };

    let analyzer = config.analyzer();
    let mut summary = ScanSummary::default();
    observer.on_start(expected);

    for path in paths {
        let outcome = process_file(&path, &analyzer, config.overwrite);
        match &outcome {
            FileOutcome::Written { dest, .. } => info!("Wrote {}", dest.display()),
            FileOutcome::Skipped { dest, .. } => info!("Skipped {} (exists)", dest.display()),
            FileOutcome::Failed { error, .. } => {
                error!("Error processing {}: {}", path.display(), error)
            }
        }
        summary.record(&outcome);
        observer.on_file(&path, &outcome);
    }

    observer.on_finish(&summary);
    summary
}

/// Discover files under `config.root` and scan them all
///
/// Fails only when the root itself is unusable.
pub fn scan_directory(config: &ScanConfig, observer: &mut dyn ScanObserver) -> Result<ScanSummary> {
    let discovery = Discovery::new(&config.root, config.recursive)?;
    Ok(run_scan(discovery.iter(), config, observer))
}
