//! Shared pipeline logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! validate range -> fetch -> normalize -> reshape (filter/pivot/rank/flatten)
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::data::{GenerationSource, RawRecord};
use crate::domain::{DateRange, ReshapeConfig};
use crate::error::AppError;
use crate::ingest;
use crate::reshape::{self, Reshaped};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// The raw records as fetched, kept so selection/sort changes can rebuild
    /// everything without another fetch.
    pub records: Vec<RawRecord>,
    /// Every fuel type seen in the fetch, before filtering.
    pub discovered: BTreeSet<String>,
    /// The fuel types the reshape actually kept.
    pub selected: BTreeSet<String>,
    pub reshaped: Reshaped,
}

/// Validate the range, fetch one page of records, and transform them.
///
/// The range check happens before the source is touched: an inverted range
/// must be observable as zero fetch calls.
pub fn run(
    source: &dyn GenerationSource,
    start: NaiveDate,
    end: NaiveDate,
    selection: Option<&BTreeSet<String>>,
    config: &ReshapeConfig,
) -> Result<RunOutput, AppError> {
    let range = DateRange::new(start, end)?;
    let records = source.fetch_hourly(&range)?;
    run_with_records(records, selection, config)
}

/// Transform already-fetched records.
///
/// This is what the TUI calls when only the selection or sort order changed.
/// `selection: None` means "every discovered fuel type" (the default); an
/// explicit empty set means nothing is shown.
pub fn run_with_records(
    records: Vec<RawRecord>,
    selection: Option<&BTreeSet<String>>,
    config: &ReshapeConfig,
) -> Result<RunOutput, AppError> {
    let tidy = ingest::normalize(&records)?;

    let discovered: BTreeSet<String> = tidy.iter().map(|row| row.category.clone()).collect();
    let selected = match selection {
        Some(set) => set.clone(),
        None => discovered.clone(),
    };

    let reshaped = reshape::reshape(&tidy, &selected, config)?;

    Ok(RunOutput {
        records,
        discovered,
        selected,
        reshaped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn record(period: &str, fueltype: &str, value: Option<f64>) -> RawRecord {
        RawRecord {
            period: period.to_string(),
            fueltype: fueltype.to_string(),
            type_name: None,
            value,
        }
    }

    /// Counts calls and returns a canned page.
    struct CountingSource {
        calls: Cell<usize>,
        result: Result<Vec<RawRecord>, AppError>,
    }

    impl CountingSource {
        fn returning(records: Vec<RawRecord>) -> Self {
            Self { calls: Cell::new(0), result: Ok(records) }
        }

        fn failing(err: AppError) -> Self {
            Self { calls: Cell::new(0), result: Err(err) }
        }
    }

    impl GenerationSource for CountingSource {
        fn fetch_hourly(&self, _range: &DateRange) -> Result<Vec<RawRecord>, AppError> {
            self.calls.set(self.calls.get() + 1);
            self.result.clone()
        }
    }

    #[test]
    fn invalid_range_never_reaches_the_source() {
        let source = CountingSource::returning(vec![record("2024-06-01T00", "SUN", Some(1.0))]);
        let err = run(&source, date(2), date(1), None, &ReshapeConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn fetch_failure_surfaces_and_nothing_is_computed() {
        let source = CountingSource::failing(AppError::Fetch {
            status: Some(500),
            message: "EIA request failed with status 500.".into(),
        });
        let err = run(&source, date(1), date(2), None, &ReshapeConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::Fetch { status: Some(500), .. }));
    }

    #[test]
    fn default_selection_is_every_discovered_fuel_type() {
        let source = CountingSource::returning(vec![
            record("2024-06-01T00", "SUN", Some(10.0)),
            record("2024-06-01T00", "WND", Some(5.0)),
        ]);
        let out = run(&source, date(1), date(1), None, &ReshapeConfig::default()).unwrap();
        assert_eq!(out.selected, out.discovered);
        assert_eq!(out.selected.len(), 2);
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn explicit_empty_selection_shows_nothing() {
        let records = vec![record("2024-06-01T00", "SUN", Some(10.0))];
        let empty = BTreeSet::new();
        let out = run_with_records(records, Some(&empty), &ReshapeConfig::default()).unwrap();
        assert!(out.reshaped.chart.is_empty());
        assert_eq!(out.discovered.len(), 1);
    }

    #[test]
    fn empty_page_is_no_data_not_an_error() {
        let source = CountingSource::returning(Vec::new());
        let out = run(&source, date(1), date(2), None, &ReshapeConfig::default()).unwrap();
        assert!(out.reshaped.chart.is_empty());
        assert!(out.discovered.is_empty());
    }
}
