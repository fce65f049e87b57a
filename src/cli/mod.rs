//! Command-line parsing for the EIA fuel-mix viewer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the transform code.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::{DuplicatePolicy, MissingPolicy, SortOrder};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fuelmix", version, about = "EIA hourly fuel-mix viewer (PJM)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a date range and print the hourly table plus ranked totals.
    Show(FetchArgs),
    /// Print ranked fuel-type totals only (useful for scripting).
    Rank(FetchArgs),
    /// Fetch a date range and write the hourly table as CSV.
    Export(ExportArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `fuelmix show`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(FetchArgs),
}

/// Common options for fetching and transforming.
#[derive(Debug, Parser, Clone)]
pub struct FetchArgs {
    /// Start date (YYYY-MM-DD).
    #[arg(short = 's', long, default_value = "2024-06-01")]
    pub start: NaiveDate,

    /// End date (YYYY-MM-DD), inclusive of its last hour.
    #[arg(short = 'e', long, default_value = "2024-06-02")]
    pub end: NaiveDate,

    /// Fuel types to display (repeatable). Defaults to every fuel type
    /// present in the response.
    #[arg(long = "source", value_name = "FUELTYPE")]
    pub sources: Vec<String>,

    /// Sort direction for fuel-type totals.
    #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
    pub order: SortOrder,

    /// How duplicate (hour, fuel type) cells are resolved.
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Reject)]
    pub duplicates: DuplicatePolicy,

    /// How missing cells appear in chart rows and CSV exports.
    #[arg(long, value_enum, default_value_t = MissingPolicy::Omit)]
    pub missing: MissingPolicy,
}

impl FetchArgs {
    /// `--source` flags as a selection set; `None` means "all discovered".
    pub fn selection(&self) -> Option<BTreeSet<String>> {
        if self.sources.is_empty() {
            None
        } else {
            Some(self.sources.iter().cloned().collect())
        }
    }
}

/// Options for the CSV export.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Output CSV path.
    #[arg(short = 'o', long, default_value = "fuelmix.csv")]
    pub out: PathBuf,
}
