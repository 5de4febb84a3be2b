/// Core module for CSV shape analysis
///
/// This module contains discovery of candidate files, dialect sniffing and the
/// streaming shape analyzer.

pub mod analyzer;
pub mod dialect;
pub mod discovery;
