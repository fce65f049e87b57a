//! Record normalization: raw EIA rows into tidy observations.
//!
//! Normalization is total over the batch: either every record parses or the
//! whole fetch fails with `MalformedRecord`. Skipping bad rows would silently
//! shorten the series and understate every total behind the chart.

use chrono::{NaiveDate, NaiveDateTime};

use crate::data::RawRecord;
use crate::domain::TidyRow;
use crate::error::AppError;

/// Convert raw records into tidy rows, renaming `value` to `magnitude`.
///
/// A `null` value passes through as `None`; no deduplication happens here —
/// duplicate (timestamp, fuel type) pairs are the pivot's problem (see
/// `DuplicatePolicy`). Output order carries no meaning.
pub fn normalize(records: &[RawRecord]) -> Result<Vec<TidyRow>, AppError> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        out.push(TidyRow {
            timestamp: parse_period(&record.period)?,
            category: record.fueltype.clone(),
            magnitude: record.value,
        });
    }
    Ok(out)
}

/// Parse an EIA hourly period (`2024-06-01T00`) into a timestamp.
fn parse_period(period: &str) -> Result<NaiveDateTime, AppError> {
    let malformed = || AppError::MalformedRecord(format!("Unparsable period '{period}'."));

    let (date_part, hour_part) = period.split_once('T').ok_or_else(malformed)?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| malformed())?;
    let hour: u32 = hour_part.parse().map_err(|_| malformed())?;
    date.and_hms_opt(hour, 0, 0).ok_or_else(malformed)
}
