/// csvhero - write shape readmes for your CSV files
///
/// This library discovers CSV files under a directory, measures each file's
/// shape (header columns and data row count) without loading it into memory,
/// and leaves a small markdown companion next to it.

pub mod app;
pub mod core;
pub mod error;
pub mod utils;

// Re-export main types for convenience
pub use crate::core::analyzer::{analyze_csv, FileProfile, ShapeAnalyzer};
pub use crate::core::dialect::Dialect;
pub use crate::core::discovery::{discover_csvs, Discovery};
pub use crate::error::{CsvHeroError, Result};
pub use crate::utils::file_utils::readme_path_for;
pub use crate::utils::output_formatter::{format_shape_markdown, write_readme};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name printed in banners and report footers
pub const TOOL_NAME: &str = "csvhero";

/// Scan configuration and the optional JSON config file
pub mod config {
    use std::path::{Path, PathBuf};

    use anyhow::Context;
    use encoding_rs::Encoding;
    use log::info;
    use serde::Deserialize;

    use crate::core::analyzer::{ShapeAnalyzer, DEFAULT_SAMPLE_SIZE};
    use crate::utils::file_utils::resolve_encoding;

    /// Settings read from `--config`; every key is optional
    #[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct ConfigFile {
        pub recursive: Option<bool>,
        pub overwrite: Option<bool>,
        pub encoding: Option<String>,
        pub sample_size: Option<usize>,
    }

    impl ConfigFile {
        /// Load a JSON config file
        pub fn load(path: &Path) -> anyhow::Result<Self> {
            let config_str = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = serde_json::from_str(&config_str)
                .with_context(|| format!("Invalid JSON in config file: {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
    }

    /// Everything a scan needs to run
    #[derive(Debug, Clone)]
    pub struct ScanConfig {
        pub root: PathBuf,
        pub recursive: bool,
        pub overwrite: bool,
        pub encoding: &'static Encoding,
        pub sample_size: usize,
    }

    impl ScanConfig {
        /// Defaults: no recursion, no overwrite, UTF-8, 4 KiB sample
        pub fn new<P: Into<PathBuf>>(root: P) -> Self {
            Self {
                root: root.into(),
                recursive: false,
                overwrite: false,
                encoding: encoding_rs::UTF_8,
                sample_size: DEFAULT_SAMPLE_SIZE,
            }
        }

        /// Apply values present in a config file
        pub fn merge_file(mut self, file: &ConfigFile) -> crate::Result<Self> {
            if let Some(recursive) = file.recursive {
                self.recursive = recursive;
            }
            if let Some(overwrite) = file.overwrite {
                self.overwrite = overwrite;
            }
            if let Some(label) = &file.encoding {
                self.encoding = resolve_encoding(label)?;
            }
            if let Some(sample_size) = file.sample_size {
                self.sample_size = sample_size;
            }
            Ok(self)
        }

        pub fn analyzer(&self) -> ShapeAnalyzer {
            ShapeAnalyzer::new(self.encoding, self.sample_size)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = ScanConfig::new("data");
            assert!(!config.recursive);
            assert!(!config.overwrite);
            assert_eq!(config.encoding, encoding_rs::UTF_8);
            assert_eq!(config.sample_size, 4096);
        }

        #[test]
        fn test_merge_file_values() {
            let file: ConfigFile =
                serde_json::from_str(r#"{"recursive": true, "encoding": "latin1"}"#).unwrap();
            let config = ScanConfig::new("data").merge_file(&file).unwrap();
            assert!(config.recursive);
            assert!(!config.overwrite);
            assert_eq!(config.encoding, encoding_rs::WINDOWS_1252);
        }

        #[test]
        fn test_bad_config_inputs() {
            assert!(serde_json::from_str::<ConfigFile>(r#"{"recurse": true}"#).is_err());

            let file = ConfigFile {
                encoding: Some("nonsense".to_string()),
                ..Default::default()
            };
            assert!(ScanConfig::new("data").merge_file(&file).is_err());
        }

        #[test]
        fn test_load_from_disk() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("csvhero.json");
            std::fs::write(&path, r#"{"overwrite": true, "sample_size": 128}"#).unwrap();

            let file = ConfigFile::load(&path).unwrap();
            assert_eq!(file.overwrite, Some(true));
            assert_eq!(file.sample_size, Some(128));
            assert!(ConfigFile::load(&dir.path().join("missing.json")).is_err());
        }
    }
}
