/// CSV discovery
///
/// Lists `*.csv` files under a root directory, optionally descending into
/// subdirectories. The listing is lazy and can be restarted by calling
/// [`Discovery::iter`] again.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{CsvHeroError, Result};

/// Suffix a file name must end with to be picked up (case-sensitive)
pub const CSV_SUFFIX: &str = ".csv";

/// A validated scan root
#[derive(Debug, Clone)]
pub struct Discovery {
    root: PathBuf,
    recursive: bool,
}

impl Discovery {
    /// Validate the root and build a discovery over it
    ///
    /// # Arguments
    ///
    /// * `root` - Directory to scan
    /// * `recursive` - Whether to descend into subdirectories
    ///
    /// # Returns
    ///
    /// An error if the root is missing or is not a directory
    pub fn new<P: AsRef<Path>>(root: P, recursive: bool) -> Result<Self> {
        let root = root.as_ref();
        let metadata = fs::metadata(root).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CsvHeroError::RootNotFound(root.to_path_buf()),
            _ => CsvHeroError::Read {
                path: root.to_path_buf(),
                source: e,
            },
        })?;

        if !metadata.is_dir() {
            return Err(CsvHeroError::NotADirectory(root.to_path_buf()));
        }

        // Listing the directory up front surfaces permission problems as a precondition failure
        fs::read_dir(root).map_err(|e| CsvHeroError::Read {
            path: root.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            recursive,
        })
    }

    /// Start a fresh walk over the root, yielding matching regular files
    pub fn iter(&self) -> impl Iterator<Item = PathBuf> {
        let mut walker = WalkDir::new(&self.root).min_depth(1).follow_links(false);
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| has_csv_suffix(entry.path()))
            .filter(|entry| is_regular_file(entry.path()))
            .map(|entry| {
                debug!("Discovered {}", entry.path().display());
                entry.into_path()
            })
    }
}

/// Discover CSV files under `root`
///
/// Convenience wrapper around [`Discovery`] for callers that only need one pass.
pub fn discover_csvs<P: AsRef<Path>>(
    root: P,
    recursive: bool,
) -> Result<impl Iterator<Item = PathBuf>> {
    Ok(Discovery::new(root, recursive)?.iter())
}

fn has_csv_suffix(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(CSV_SUFFIX))
        .unwrap_or(false)
}

// Follows symlinks, so a link to a regular file counts and a link to a directory does not
fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
