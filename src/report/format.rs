//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the transform code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use chrono::NaiveDate;

use crate::app::pipeline::RunOutput;
use crate::data::RESPONDENT;
use crate::domain::{CategoryTotal, HOUR_FORMAT};
use crate::reshape::Reshaped;

/// Format the run summary (range, respondent, fetch counts, selection).
pub fn format_run_summary(run: &RunOutput, start: NaiveDate, end: NaiveDate) -> String {
    let mut out = String::new();

    out.push_str("=== fuelmix - EIA hourly fuel mix ===\n");
    out.push_str(&format!("Respondent: {RESPONDENT}\n"));
    out.push_str(&format!("Range: {start} .. {end} (end inclusive)\n"));
    out.push_str(&format!(
        "Records: {} | hours: {} | fuel types: {}/{} selected\n",
        run.records.len(),
        run.reshaped.wide.rows.len(),
        run.selected.len(),
        run.discovered.len(),
    ));

    out
}

/// Format the ranked totals table.
pub fn format_totals(totals: &[CategoryTotal]) -> String {
    let mut out = String::new();

    out.push_str("Fuel types by total generation:\n");
    out.push_str(format!("{:<10} {:>16}\n", "fueltype", "total (MWh)").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<10} {:-<16}\n", "", "").trim_end());
    out.push('\n');

    for entry in totals {
        out.push_str(
            format!("{:<10} {:>16.1}\n", truncate(&entry.category, 10), entry.total).trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Format the wide table: one row per hour, one column per ranked fuel type.
///
/// Missing cells print blank — a cell the source never reported must be
/// distinguishable from a reported zero.
pub fn format_wide_table(reshaped: &Reshaped) -> String {
    const VALUE_WIDTH: usize = 12;

    let mut out = String::new();

    out.push_str(&format!("{:<13}", "period"));
    for entry in &reshaped.totals {
        out.push_str(&format!(
            " {:>width$}",
            truncate(&entry.category, VALUE_WIDTH),
            width = VALUE_WIDTH
        ));
    }
    out.push('\n');

    out.push_str(&format!("{:-<13}", ""));
    for _ in &reshaped.totals {
        out.push_str(&format!(" {:-<width$}", "", width = VALUE_WIDTH));
    }
    out.push('\n');

    for (timestamp, cells) in &reshaped.wide.rows {
        out.push_str(&format!("{:<13}", timestamp.format(HOUR_FORMAT)));
        for entry in &reshaped.totals {
            match cells.get(&entry.category) {
                Some(value) => {
                    out.push_str(&format!(" {value:>width$.1}", width = VALUE_WIDTH))
                }
                None => out.push_str(&format!(" {:>width$}", "", width = VALUE_WIDTH)),
            }
        }
        out = out.trim_end().to_string();
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
