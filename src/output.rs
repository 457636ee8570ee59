//! Rendering of query results to the console or a CSV file.

use std::io::Write;
use std::path::Path;

use crate::db::QueryResult;
use crate::error::{Result, SmartLineError};

/// Prints one line per row: `{column: value, ...}` in column order.
pub fn render_console<W: Write>(writer: &mut W, result: &QueryResult) -> Result<()> {
    for record in result.records() {
        let fields: Vec<String> = record
            .iter()
            .map(|(column, value)| format!("{column}: {value}"))
            .collect();
        writeln!(writer, "{{{}}}", fields.join(", "))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes rows to `path` as CSV with the default dialect and no header.
///
/// The file is created (or truncated) only when this is called.
pub fn write_csv(path: &Path, result: &QueryResult) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| SmartLineError::output(format!("{}: {e}", path.display())))?;

    for row in &result.rows {
        writer
            .write_record(row.iter().map(|v| v.to_field_string()))
            .map_err(|e| SmartLineError::output(format!("{}: {e}", path.display())))?;
    }

    writer.flush()?;
    Ok(())
}
