/// Output formatter for shape reports
///
/// This module renders a [`FileProfile`] into its companion markdown document,
/// persists that document next to the source, and formats the console banner
/// and end-of-run summary.

use std::path::Path;

use colored::Colorize;
use log::debug;

use crate::app::ScanSummary;
use crate::core::analyzer::FileProfile;
use crate::error::{CsvHeroError, Result};
use crate::utils::file_utils::write_atomic;
use crate::TOOL_NAME;

/// Rendered in place of the column list when a file has no header
pub const NO_COLUMNS: &str = "_(none)_";

/// Render the companion document for a profile
///
/// # Arguments
///
/// * `profile` - Shape of the source file
/// * `tool_version` - Version printed in the footer
///
/// # Returns
///
/// Markdown text; identical inputs always give identical output
pub fn format_shape_markdown(profile: &FileProfile, tool_version: &str) -> String {
    let columns = if profile.columns().is_empty() {
        NO_COLUMNS.to_string()
    } else {
        profile
            .columns()
            .iter()
            .map(|c| format!("`{}`", c))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "# {name} — CSV Shape\n\
         \n\
         - **Rows (excluding header):** {rows}\n\
         - **Columns ({count}):** {columns}\n\
         \n\
         ---\n\
         \n\
         _This file was sketched by **{tool} {version}**.  \n\
         It looks only, never lingers; it counts, then quietly leaves a note._\n",
        name = profile.file_name(),
        rows = profile.row_count(),
        count = profile.column_count(),
        columns = columns,
        tool = TOOL_NAME,
        version = tool_version,
    )
}

/// Write a rendered document as UTF-8, refusing to replace an existing file
///
/// # Arguments
///
/// * `markdown` - Rendered document
/// * `dest` - Destination path, normally from `readme_path_for`
/// * `overwrite` - Replace an existing destination
///
/// # Returns
///
/// `DestinationExists` when the file is there and `overwrite` is false
pub fn write_readme(markdown: &str, dest: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && dest.exists() {
        return Err(CsvHeroError::DestinationExists(dest.to_path_buf()));
    }

    write_atomic(dest, markdown.as_bytes(), overwrite)?;
    debug!("Wrote {}", dest.display());
    Ok(())
}

/// One-line banner shown at startup
pub fn banner() -> String {
    let text = format!("{} — small tool, neat readmes.", TOOL_NAME.bold());
    let width = TOOL_NAME.chars().count() + " — small tool, neat readmes.".chars().count() + 4;
    let rule = "─".repeat(width);

    format!(
        "{}\n{}  {}  {}\n{}",
        format!("╭{}╮", rule).green(),
        "│".green(),
        text,
        "│".green(),
        format!("╰{}╯", rule).green()
    )
}

/// Two-column table summarizing a scan
pub fn format_summary_table(summary: &ScanSummary) -> String {
    let rows = [
        ("csv files seen", summary.files_seen.to_string()),
        ("rows across all csvs", summary.total_rows.to_string()),
        ("readmes written", summary.written.to_string()),
        ("readmes skipped (exists)", summary.skipped.to_string()),
        ("files failed", summary.failed.to_string()),
    ];

    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0);
    let border = format!(
        "+{}+{}+",
        "-".repeat(label_width + 2),
        "-".repeat(value_width + 2)
    );

    let mut output = String::new();
    output.push_str(&format!("{}\n", format!("{} summary", TOOL_NAME).bold()));
    output.push_str(&border);
    output.push('\n');
    output.push_str(&format!(
        "| {:<lw$} | {:>vw$} |\n",
        "stat".bold(),
        "value".bold(),
        lw = label_width,
        vw = value_width
    ));
    output.push_str(&border);
    output.push('\n');
    for (label, value) in rows.iter() {
        output.push_str(&format!(
            "| {:<lw$} | {:>vw$} |\n",
            label.cyan(),
            value,
            lw = label_width,
            vw = value_width
        ));
    }
    output.push_str(&border);
    output.push('\n');

    output
}
