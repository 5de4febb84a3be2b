/// csvhero - write shape readmes for your CSV files
///
/// The main entry point. It parses command-line arguments, sets up logging
/// and drives a scan while showing progress and a summary.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};

use csvhero::app::{self, FileOutcome, ScanObserver, ScanSummary};
use csvhero::config::{ConfigFile, ScanConfig};
use csvhero::core::discovery::Discovery;
use csvhero::utils::file_utils::resolve_encoding;
use csvhero::utils::output_formatter;

/// Command line argument structure
#[derive(Parser, Debug)]
#[command(
    name = "csvhero",
    version,
    about = "Write shape readmes for your CSV files.",
    long_about = "Walks a folder, measures every CSV (header columns and data rows) and leaves \
a small <name>.readme.md next to each one describing its shape."
)]
struct Args {
    /// Folder to scan
    #[arg(value_name = "FOLDER")]
    folder: PathBuf,

    /// Recurse into subfolders
    #[arg(short = 'r', long = "recursive", action = ArgAction::SetTrue)]
    recursive: bool,

    /// Overwrite existing readmes
    #[arg(long = "overwrite", action = ArgAction::SetTrue)]
    overwrite: bool,

    /// File encoding to use when reading CSVs (default: utf-8)
    #[arg(long = "encoding")]
    encoding: Option<String>,

    /// Path to a JSON configuration file
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Export the run summary to a JSON file
    #[arg(long = "json")]
    json: Option<PathBuf>,

    /// Hide the banner and progress bar
    #[arg(long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// Set logging level (default: warn)
    #[arg(long = "log-level", default_value = "warn")]
    log_level: LevelFilter,

    /// Write logs to this file instead of stderr
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

/// Console presentation for a running scan
struct Console {
    progress: Option<ProgressBar>,
    quiet: bool,
}

impl Console {
    fn new(quiet: bool) -> Self {
        Self {
            progress: None,
            quiet,
        }
    }

    /// Print through the progress bar when one is active so it is not torn
    fn line(&self, message: String) {
        match &self.progress {
            Some(pb) => pb.suspend(|| eprintln!("{}", message)),
            None => eprintln!("{}", message),
        }
    }
}

impl ScanObserver for Console {
    fn on_start(&mut self, expected: Option<usize>) {
        if self.quiet {
            return;
        }
        let pb = ProgressBar::new(expected.unwrap_or(0) as u64);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message("Scanning CSVs");
        self.progress = Some(pb);
    }

    fn on_file(&mut self, path: &Path, outcome: &FileOutcome) {
        if let FileOutcome::Failed { error, .. } = outcome {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            self.line(format!("{} {} — {}", "Failed:".red(), name, error));
        }
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    fn on_finish(&mut self, _summary: &ScanSummary) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
    }
}

/// Main entry point function
fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args)?;

    let config = build_config(&args)?;

    if !args.quiet {
        println!("{}", output_formatter::banner());
    }

    // Precondition failures surface here, before anything is scanned
    let discovery = Discovery::new(&config.root, config.recursive)?;
    let files: Vec<PathBuf> = discovery.iter().collect();

    if files.is_empty() {
        println!("{}", "No CSV files found.".yellow());
        return Ok(());
    }

    info!("Found {} CSV files under {}", files.len(), config.root.display());

    let mut console = Console::new(args.quiet);
    let summary = app::run_scan(files, &config, &mut console);

    println!("{}", output_formatter::format_summary_table(&summary));

    if let Some(json_path) = &args.json {
        export_summary_json(&summary, json_path)?;
    }

    println!("{} Carry on.", "Done.".green());

    Ok(())
}

/// Set up logging to stderr or to the requested file
fn setup_logging(args: &Args) -> Result<()> {
    let mut builder = env_logger::Builder::new();

    builder.filter_level(args.log_level);

    builder.format(|buf, record| {
        use chrono::Local;
        use std::io::Write;
        writeln!(
            buf,
            "{} - {} - {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(log_file) = &args.log_file {
        let file = File::create(log_file)
            .with_context(|| format!("Failed to create log file: {}", log_file.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();

    Ok(())
}

/// Merge defaults, the optional config file and command line flags
fn build_config(args: &Args) -> Result<ScanConfig> {
    let mut config = ScanConfig::new(&args.folder);

    if let Some(path) = &args.config {
        let file = ConfigFile::load(path)?;
        config = config.merge_file(&file)?;
    }

    if args.recursive {
        config.recursive = true;
    }
    if args.overwrite {
        config.overwrite = true;
    }
    if let Some(label) = &args.encoding {
        config.encoding = resolve_encoding(label)?;
    }

    Ok(config)
}

/// Export the run summary as pretty JSON
fn export_summary_json(summary: &ScanSummary, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output file: {}", output_path.display()))?;

    serde_json::to_writer_pretty(file, summary).context("Failed to write JSON data")?;

    info!("Exported summary to {}", output_path.display());
    Ok(())
}
