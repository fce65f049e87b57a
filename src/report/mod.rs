//! Reporting utilities: formatted terminal output for the pipeline results.

pub mod format;

pub use format::*;
