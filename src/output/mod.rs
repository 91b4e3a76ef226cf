//! Output formatting for CLI results

use serde::Serialize;
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod formatters;
pub mod json;
pub mod table;

/// Render rows in the requested format
pub fn render_rows<T: Tabled + Serialize>(rows: &[T], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Pretty => Ok(table::format_table(rows)),
        OutputFormat::Json => Ok(json::format_json(rows)?),
    }
}

/// Format and print rows to stdout
pub fn print_rows<T: Tabled + Serialize>(rows: &[T], format: OutputFormat) -> Result<()> {
    println!("{}", render_rows(rows, format)?);
    Ok(())
}
