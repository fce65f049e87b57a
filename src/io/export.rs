//! Export the wide table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: UTF-8, comma-delimited, header row is `period` followed by the
//! ranked fuel-type names, one row per hour.

use std::path::Path;

use crate::domain::{HOUR_FORMAT, MissingPolicy};
use crate::error::AppError;
use crate::reshape::Reshaped;

/// Encode the wide table as CSV bytes.
///
/// Missing cells become empty fields under `MissingPolicy::Omit` and literal
/// zeros under `MissingPolicy::Zero`.
pub fn render_wide_csv(reshaped: &Reshaped, missing: MissingPolicy) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["period".to_string()];
    header.extend(reshaped.totals.iter().map(|t| t.category.clone()));
    writer
        .write_record(&header)
        .map_err(|e| AppError::Export(format!("Failed to write CSV header: {e}")))?;

    for (timestamp, cells) in &reshaped.wide.rows {
        let mut record = vec![timestamp.format(HOUR_FORMAT).to_string()];
        for entry in &reshaped.totals {
            record.push(match (cells.get(&entry.category), missing) {
                (Some(value), _) => format!("{value}"),
                (None, MissingPolicy::Zero) => "0".to_string(),
                (None, MissingPolicy::Omit) => String::new(),
            });
        }
        writer
            .write_record(&record)
            .map_err(|e| AppError::Export(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Export(format!("Failed to flush CSV: {e}")))
}

/// Write the wide table to a CSV file.
pub fn write_wide_csv(
    path: &Path,
    reshaped: &Reshaped,
    missing: MissingPolicy,
) -> Result<(), AppError> {
    let bytes = render_wide_csv(reshaped, missing)?;
    std::fs::write(path, bytes).map_err(|e| {
        AppError::Export(format!("Failed to write CSV '{}': {e}", path.display()))
    })
}
