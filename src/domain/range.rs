//! Validated date range for a fetch.
//!
//! The range is checked once, up front, so an inverted range is rejected
//! before any request goes out. Equality of start and end is valid: it is
//! the single-day query (the end date is inclusive of its last hour).

use chrono::NaiveDate;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `end < start`. `start == end` is allowed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if end < start {
            return Err(AppError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Start bound at hour precision: the first hour of the start date.
    pub fn start_bound(&self) -> String {
        self.start.format("%Y-%m-%dT00").to_string()
    }

    /// End bound at hour precision: the last hour of the end date, so the
    /// end date participates in full (the API treats `end` as inclusive).
    pub fn end_bound(&self) -> String {
        self.end.format("%Y-%m-%dT23").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn ordered_range_is_valid() {
        assert!(DateRange::new(date(2024, 6, 1), date(2024, 6, 2)).is_ok());
    }

    #[test]
    fn equal_dates_are_valid_single_day_query() {
        let range = DateRange::new(date(2024, 6, 1), date(2024, 6, 1)).unwrap();
        assert_eq!(range.start_bound(), "2024-06-01T00");
        assert_eq!(range.end_bound(), "2024-06-01T23");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = DateRange::new(date(2024, 6, 2), date(2024, 6, 1)).unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn bounds_cover_whole_days() {
        let range = DateRange::new(date(2024, 6, 1), date(2024, 6, 2)).unwrap();
        assert_eq!(range.start_bound(), "2024-06-01T00");
        assert_eq!(range.end_bound(), "2024-06-02T23");
    }
}
