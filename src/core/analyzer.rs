/// CSV shape analyzer
///
/// This file contains the ShapeAnalyzer, which reduces one delimited text file
/// to a [`FileProfile`]: its header fields and the number of records after it.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Instant;

use encoding_rs::Encoding;
use log::{debug, info};
use serde::Serialize;

use crate::core::dialect::{BlankLineTracker, Dialect};
use crate::error::{CsvHeroError, Result};
use crate::utils::file_utils::{decode_sample, resolve_path, DecodingReader};

/// Bytes read from the start of a file for dialect sniffing
pub const DEFAULT_SAMPLE_SIZE: usize = 4096;

/// Shape of a single CSV file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileProfile {
    path: PathBuf,
    rows: u64,
    columns: Vec<String>,
}

impl FileProfile {
    pub fn new(path: PathBuf, rows: u64, columns: Vec<String>) -> Self {
        Self { path, rows, columns }
    }

    /// Absolute location of the source file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data records, header excluded
    pub fn row_count(&self) -> u64 {
        self.rows
    }

    /// Header fields exactly as found, duplicates and blanks included
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// File name of the source, for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Streams CSV files to measure their shape
#[derive(Debug, Clone)]
pub struct ShapeAnalyzer {
    /// Encoding used to decode file contents
    encoding: &'static Encoding,

    /// Size of the leading sample used for dialect sniffing
    sample_size: usize,
}

impl Default for ShapeAnalyzer {
    fn default() -> Self {
        Self::new(encoding_rs::UTF_8, DEFAULT_SAMPLE_SIZE)
    }
}

impl ShapeAnalyzer {
    /// Create a new ShapeAnalyzer
    ///
    /// # Arguments
    ///
    /// * `encoding` - Encoding of the files to analyze
    /// * `sample_size` - Bytes to sample for dialect sniffing (at least 1)
    pub fn new(encoding: &'static Encoding, sample_size: usize) -> Self {
        Self {
            encoding,
            sample_size: sample_size.max(1),
        }
    }

    /// Analyze a file and return its shape
    ///
    /// Only a bounded sample and one record buffer are held in memory, whatever
    /// the file size. Ragged rows count the same as well-formed ones, and an
    /// empty line is an empty record; if it comes first, the header is empty.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to the CSV file
    ///
    /// # Returns
    ///
    /// The profile, or a read/parse failure naming the file
    pub fn analyze_file(&self, file_path: &Path) -> Result<FileProfile> {
        info!("Analyzing file: {}", file_path.display());
        let start_time = Instant::now();

        let read_err = |source: std::io::Error| CsvHeroError::Read {
            path: file_path.to_path_buf(),
            source,
        };
        let parse_err = |source: csv::Error| CsvHeroError::Parse {
            path: file_path.to_path_buf(),
            source,
        };

        let mut file = File::open(file_path).map_err(read_err)?;
        let path = resolve_path(file_path)?;

        let dialect = self.sniff_dialect(&mut file).map_err(read_err)?;
        file.seek(SeekFrom::Start(0)).map_err(read_err)?;

        // The csv reader skips empty lines, so the tracker counts them on the way through
        let tracker = BlankLineTracker::new(DecodingReader::new(file, self.encoding), &dialect);
        let mut reader = dialect.reader_builder().from_reader(tracker);

        let mut first = csv::StringRecord::new();
        let mut parsed: u64 = 0;
        if reader.read_record(&mut first).map_err(parse_err)? {
            parsed += 1;
        }

        // Reuse one buffer; record contents are never kept
        let mut record = csv::ByteRecord::new();
        while reader.read_byte_record(&mut record).map_err(parse_err)? {
            parsed += 1;
        }

        let tracker = reader.get_ref();
        let records = parsed + tracker.blank_lines();
        if records == 0 {
            info!("{} has no records", file_path.display());
            return Ok(FileProfile::new(path, 0, Vec::new()));
        }

        let columns: Vec<String> = if tracker.leading_blank() {
            Vec::new()
        } else {
            first.iter().map(str::to_string).collect()
        };
        let rows = records - 1;

        info!(
            "Counted {} rows and {} columns in {:?}",
            rows,
            columns.len(),
            start_time.elapsed()
        );

        Ok(FileProfile::new(path, rows, columns))
    }

    /// Read the leading sample and guess the dialect, falling back to the default
    fn sniff_dialect(&self, file: &mut File) -> std::io::Result<Dialect> {
        let mut buffer = Vec::with_capacity(self.sample_size);
        file.by_ref()
            .take(self.sample_size as u64)
            .read_to_end(&mut buffer)?;

        let truncated = buffer.len() == self.sample_size;
        let sample = decode_sample(self.encoding, &buffer);
        debug!("Sampled {} bytes (truncated: {})", buffer.len(), truncated);

        Ok(Dialect::sniff(&sample, truncated).unwrap_or_else(|| {
            debug!("Dialect inconclusive, using default");
            Dialect::default()
        }))
    }
}

/// Analyze one file with UTF-8 decoding and the default sample size
pub fn analyze_csv<P: AsRef<Path>>(path: P) -> Result<FileProfile> {
    ShapeAnalyzer::default().analyze_file(path.as_ref())
}
