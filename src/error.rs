/// Error types for csvhero
///
/// Precondition failures stop a scan before it starts. Per-file failures are
/// returned to the caller, which decides whether the batch keeps going.

use std::io;
use std::path::PathBuf;

/// Everything that can go wrong while discovering, analyzing or writing
#[derive(Debug, thiserror::Error)]
pub enum CsvHeroError {
    /// Scan root does not exist
    #[error("Directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// Scan root exists but is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Encoding label not known to encoding_rs
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Source file could not be opened, read or resolved
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Record reader gave up on the file
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Companion document already present and overwrite was not requested
    #[error("README already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// Companion document could not be persisted
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CsvHeroError {
    /// True when the failure should be tallied as a skip rather than reported
    pub fn is_skip(&self) -> bool {
        matches!(self, CsvHeroError::DestinationExists(_))
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, CsvHeroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_destination_exists_is_skip() {
        assert!(CsvHeroError::DestinationExists(PathBuf::from("a.readme.md")).is_skip());
        assert!(!CsvHeroError::RootNotFound(PathBuf::from("nope")).is_skip());
        let read = CsvHeroError::Read {
            path: PathBuf::from("a.csv"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!read.is_skip());
    }

    #[test]
    fn test_messages_name_the_path() {
        let err = CsvHeroError::Read {
            path: PathBuf::from("data/orders.csv"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("data/orders.csv"));
        assert!(msg.contains("gone"));
    }
}
