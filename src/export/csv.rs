//! CSV rendering of checkpoints.

use super::{Checkpoint, ExportError};
use std::io::Write;

/// Format minutes as `H:MM`, rounded to the nearest minute.
pub fn format_clock(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Export checkpoints to CSV format.
pub fn export_csv(checkpoints: &[Checkpoint]) -> Result<String, ExportError> {
    if checkpoints.is_empty() {
        return Err(ExportError::NoData);
    }

    let mut output = Vec::new();

    writeln!(output, "name,mile,target_minutes,target_clock,effort,cutoff_minutes")
        .map_err(|e| ExportError::WriteFailed(e.to_string()))?;

    for checkpoint in checkpoints {
        writeln!(
            output,
            "{},{:.2},{:.1},{},{},{}",
            escape(&checkpoint.name),
            checkpoint.mile,
            checkpoint.target_minutes,
            format_clock(checkpoint.target_minutes),
            checkpoint.effort.label(),
            checkpoint
                .cutoff_minutes
                .map_or(String::new(), |v| format!("{:.1}", v)),
        )
        .map_err(|e| ExportError::WriteFailed(e.to_string()))?;
    }

    String::from_utf8(output).map_err(|e| ExportError::WriteFailed(e.to_string()))
}

/// Export checkpoints to CSV and write to a file.
pub fn export_csv_to_file(
    checkpoints: &[Checkpoint],
    path: &std::path::Path,
) -> Result<(), ExportError> {
    let content = export_csv(checkpoints)?;
    std::fs::write(path, content)?;
    Ok(())
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
