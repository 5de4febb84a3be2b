/// Utility modules for csvhero
///
/// This module contains utility functions for file handling, decoding,
/// report rendering and console output.

pub mod file_utils;
pub mod output_formatter;
