//! Application error taxonomy.
//!
//! Every fatal condition in the pipeline maps to one of these variants and
//! surfaces to the user as a plain message plus a process exit code:
//!
//! - `2` — usage/config/input problems (bad range, missing key, export path)
//! - `4` — runtime failures (fetch, malformed data, terminal backend)
//!
//! An empty result is deliberately NOT an error: a successful fetch with zero
//! surviving rows renders as "no data available" (see `reshape`).

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// The requested end date precedes the start date. Raised before any
    /// fetch is attempted.
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// Missing credential or unusable configuration value.
    Config(String),
    /// Non-success HTTP status, transport error, or unparsable body from the
    /// data source. Carries the status code when one was received.
    Fetch { status: Option<u16>, message: String },
    /// A raw record could not be normalized (bad period timestamp, or a
    /// duplicate cell under `DuplicatePolicy::Reject`). Fails the whole
    /// batch, never a single row.
    MalformedRecord(String),
    /// CSV export I/O failure.
    Export(String),
    /// Terminal backend failure in the TUI.
    Terminal(String),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::InvalidRange { .. } | AppError::Config(_) | AppError::Export(_) => 2,
            AppError::Fetch { .. } | AppError::MalformedRecord(_) | AppError::Terminal(_) => 4,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidRange { start, end } => {
                write!(f, "Invalid date range: end {end} falls before start {start}.")
            }
            AppError::Config(message) => write!(f, "{message}"),
            AppError::Fetch { status: Some(code), message } => {
                write!(f, "Failed to fetch data ({code}): {message}")
            }
            AppError::Fetch { status: None, message } => {
                write!(f, "Failed to fetch data: {message}")
            }
            AppError::MalformedRecord(message) => write!(f, "Malformed record: {message}"),
            AppError::Export(message) => write!(f, "{message}"),
            AppError::Terminal(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for AppError {}
