//! Input/output helpers.
//!
//! - wide-table CSV export (`export`)

pub mod export;

pub use export::*;
