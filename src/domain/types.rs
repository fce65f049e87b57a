//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during reshaping
//! - exported to CSV
//! - rendered by either the CLI reports or the TUI chart

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Hour-precision timestamp format used by the EIA hourly endpoints
/// (`2024-06-01T00`). Also the format of the first CSV export column.
pub const HOUR_FORMAT: &str = "%Y-%m-%dT%H";

/// Sort direction for fuel-type totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest total first.
    Asc,
    /// Largest total first.
    Desc,
}

/// How duplicate (timestamp, fuel type) cells are resolved during the pivot.
///
/// The upstream API should never emit duplicates, but the pivot must decide
/// rather than silently keep whichever row happened to arrive last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Treat a duplicate cell as a malformed batch and fail the fetch.
    Reject,
    /// Sum the duplicate magnitudes into one cell.
    Sum,
    /// Keep the last value in input order. This reproduces the behavior of a
    /// plain map insert and exists for fidelity with older exports.
    LastWins,
}

/// How missing cells appear in flattened chart rows and CSV exports.
///
/// Ranking is unaffected: totals always sum the cells that are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Leave missing cells out entirely (blank CSV field, no chart row).
    Omit,
    /// Emit missing cells as an explicit zero.
    Zero,
}

/// Transform configuration shared by every front-end.
#[derive(Debug, Clone, Copy)]
pub struct ReshapeConfig {
    pub order: SortOrder,
    pub duplicates: DuplicatePolicy,
    pub missing: MissingPolicy,
}

impl Default for ReshapeConfig {
    fn default() -> Self {
        Self {
            order: SortOrder::Desc,
            duplicates: DuplicatePolicy::Reject,
            missing: MissingPolicy::Omit,
        }
    }
}

/// One normalized observation: an hour, a fuel type, and a magnitude.
///
/// `magnitude` is `None` when the source reported `null` — a missing value is
/// carried through as missing, never coerced to zero, so downstream totals
/// are not distorted.
#[derive(Debug, Clone, PartialEq)]
pub struct TidyRow {
    pub timestamp: NaiveDateTime,
    pub category: String,
    pub magnitude: Option<f64>,
}

/// The pivoted table: one row per hour, one cell per fuel type with a value.
///
/// Invariants:
/// - `rows` keys are exactly the timestamps of the filtered tidy rows
/// - a (timestamp, category) cell exists only if an input row carried a value
/// - `categories` is the set of fuel types that survived filtering, including
///   ones whose every magnitude was missing (they rank with total 0)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    pub rows: BTreeMap<NaiveDateTime, BTreeMap<String, f64>>,
    pub categories: BTreeSet<String>,
}

impl WideTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Aggregate generation for one fuel type, used only to order series.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// One flattened cell in ranked series order, ready for a charting sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub timestamp: NaiveDateTime,
    pub category: String,
    pub magnitude: f64,
}
