//! Long-to-wide reshape, ranking, and re-melt for charting.
//!
//! This is a pure, stateless transform: the front-ends re-invoke it from the
//! full tidy sequence whenever the selection, the sort order, or the fetched
//! data changes. Input sizes are bounded by one API page, so recomputation
//! beats an incremental update path.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::domain::{
    CategoryTotal, ChartRow, DuplicatePolicy, MissingPolicy, ReshapeConfig, SortOrder, TidyRow,
    WideTable,
};
use crate::error::AppError;

/// Everything the sinks consume: the wide table, the ranked totals, and the
/// flattened chart rows in ranked series order.
#[derive(Debug, Clone, PartialEq)]
pub struct Reshaped {
    pub wide: WideTable,
    pub totals: Vec<CategoryTotal>,
    pub chart: Vec<ChartRow>,
}

/// Filter to the selected fuel types, pivot, rank, and flatten.
///
/// An empty selection yields an empty result — explicitly nothing, not "all".
/// Empty input is not an error either; an empty chart row sequence is the
/// "no data" observable and the caller decides how to render it.
pub fn reshape(
    tidy: &[TidyRow],
    selected: &BTreeSet<String>,
    config: &ReshapeConfig,
) -> Result<Reshaped, AppError> {
    let wide = pivot(tidy, selected, config.duplicates)?;
    let totals = rank(&wide, config.order);
    let chart = flatten(&wide, &totals, config.missing);
    Ok(Reshaped { wide, totals, chart })
}

/// Group filtered rows by timestamp, then by fuel type.
///
/// Every filtered row contributes its timestamp to the row set, but only rows
/// with a present magnitude create a cell — a missing value must not become a
/// zero. Duplicate cells resolve per `policy`; duplicates are judged over
/// present magnitudes only, so a missing-value row never conflicts.
fn pivot(
    tidy: &[TidyRow],
    selected: &BTreeSet<String>,
    policy: DuplicatePolicy,
) -> Result<WideTable, AppError> {
    let mut rows: BTreeMap<NaiveDateTime, BTreeMap<String, f64>> = BTreeMap::new();
    let mut categories = BTreeSet::new();

    for row in tidy.iter().filter(|r| selected.contains(&r.category)) {
        categories.insert(row.category.clone());
        let cells = rows.entry(row.timestamp).or_default();

        let Some(magnitude) = row.magnitude else {
            continue;
        };

        match cells.entry(row.category.clone()) {
            Entry::Vacant(cell) => {
                cell.insert(magnitude);
            }
            Entry::Occupied(mut cell) => match policy {
                DuplicatePolicy::Reject => {
                    return Err(AppError::MalformedRecord(format!(
                        "Duplicate cell for {} at {}.",
                        row.category,
                        row.timestamp.format(crate::domain::HOUR_FORMAT)
                    )));
                }
                DuplicatePolicy::Sum => {
                    *cell.get_mut() += magnitude;
                }
                DuplicatePolicy::LastWins => {
                    cell.insert(magnitude);
                }
            },
        }
    }

    Ok(WideTable { rows, categories })
}

/// Total each surviving fuel type and sort.
///
/// Missing cells contribute nothing to a total (they sum as zero; summation,
/// unlike display, must not propagate "missing"). Ties break by fuel-type
/// name, ascending, so the order is deterministic.
fn rank(wide: &WideTable, order: SortOrder) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = wide
        .categories
        .iter()
        .map(|category| CategoryTotal {
            category: category.clone(),
            total: wide
                .rows
                .values()
                .filter_map(|cells| cells.get(category))
                .sum(),
        })
        .collect();

    totals.sort_by(|a, b| {
        let by_total = match order {
            SortOrder::Asc => a.total.partial_cmp(&b.total),
            SortOrder::Desc => b.total.partial_cmp(&a.total),
        }
        .unwrap_or(Ordering::Equal);
        by_total.then_with(|| a.category.cmp(&b.category))
    });

    totals
}

/// Re-emit chart rows in ranked series order.
///
/// Series order is what the rendering sink consumes as declared column order;
/// within a series, rows stay in timestamp order with their original
/// magnitudes. Missing cells are omitted (or zero-filled under
/// `MissingPolicy::Zero`).
fn flatten(wide: &WideTable, ranked: &[CategoryTotal], missing: MissingPolicy) -> Vec<ChartRow> {
    let mut out = Vec::new();
    for entry in ranked {
        for (timestamp, cells) in &wide.rows {
            match (cells.get(&entry.category), missing) {
                (Some(&magnitude), _) => out.push(ChartRow {
                    timestamp: *timestamp,
                    category: entry.category.clone(),
                    magnitude,
                }),
                (None, MissingPolicy::Zero) => out.push(ChartRow {
                    timestamp: *timestamp,
                    category: entry.category.clone(),
                    magnitude: 0.0,
                }),
                (None, MissingPolicy::Omit) => {}
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hour(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn row(d: u32, h: u32, category: &str, magnitude: Option<f64>) -> TidyRow {
        TidyRow {
            timestamp: hour(d, h),
            category: category.to_string(),
            magnitude,
        }
    }

    fn select(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> ReshapeConfig {
        ReshapeConfig::default()
    }

    #[test]
    fn empty_selection_yields_empty_output() {
        let tidy = vec![row(1, 0, "SUN", Some(10.0)), row(1, 0, "WND", Some(5.0))];
        let out = reshape(&tidy, &BTreeSet::new(), &config()).unwrap();
        assert!(out.chart.is_empty());
        assert!(out.totals.is_empty());
        assert!(out.wide.is_empty());
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let out = reshape(&[], &select(&["SUN"]), &config()).unwrap();
        assert!(out.chart.is_empty());
    }

    #[test]
    fn filter_drops_unselected_categories() {
        let tidy = vec![row(1, 0, "SUN", Some(10.0)), row(1, 0, "NG", Some(50.0))];
        let out = reshape(&tidy, &select(&["SUN"]), &config()).unwrap();
        assert_eq!(out.totals.len(), 1);
        assert_eq!(out.totals[0].category, "SUN");
        assert!(out.chart.iter().all(|r| r.category == "SUN"));
    }

    #[test]
    fn full_selection_is_a_projection_of_present_values() {
        let tidy = vec![
            row(1, 0, "SUN", Some(10.0)),
            row(1, 0, "WND", Some(5.0)),
            row(1, 1, "SUN", Some(12.0)),
            row(1, 1, "WND", None),
        ];
        let out = reshape(&tidy, &select(&["SUN", "WND"]), &config()).unwrap();

        let got: BTreeSet<(NaiveDateTime, String, String)> = out
            .chart
            .iter()
            .map(|r| (r.timestamp, r.category.clone(), format!("{}", r.magnitude)))
            .collect();
        let want: BTreeSet<(NaiveDateTime, String, String)> = tidy
            .iter()
            .filter_map(|r| {
                r.magnitude
                    .map(|m| (r.timestamp, r.category.clone(), format!("{m}")))
            })
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn reshape_is_idempotent() {
        let tidy = vec![
            row(1, 0, "SUN", Some(10.0)),
            row(1, 0, "WND", Some(5.0)),
            row(1, 1, "SUN", Some(12.0)),
        ];
        let selected = select(&["SUN", "WND"]);
        let a = reshape(&tidy, &selected, &config()).unwrap();
        let b = reshape(&tidy, &selected, &config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn descending_totals_are_a_total_order_with_name_ties() {
        let tidy = vec![
            row(1, 0, "NG", Some(7.0)),
            row(1, 0, "COL", Some(7.0)),
            row(1, 0, "SUN", Some(22.0)),
            row(1, 0, "WND", Some(5.0)),
        ];
        let out = reshape(&tidy, &select(&["NG", "COL", "SUN", "WND"]), &config()).unwrap();
        let order: Vec<&str> = out.totals.iter().map(|t| t.category.as_str()).collect();
        // COL before NG: equal totals fall back to ascending name.
        assert_eq!(order, vec!["SUN", "COL", "NG", "WND"]);
        for pair in out.totals.windows(2) {
            assert!(pair[0].total >= pair[1].total);
        }
    }

    #[test]
    fn ascending_reverses_the_totals() {
        let tidy = vec![
            row(1, 0, "SUN", Some(22.0)),
            row(1, 0, "WND", Some(5.0)),
            row(1, 0, "NG", Some(7.0)),
        ];
        let mut cfg = config();
        cfg.order = SortOrder::Asc;
        let out = reshape(&tidy, &select(&["SUN", "WND", "NG"]), &cfg).unwrap();
        let order: Vec<&str> = out.totals.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(order, vec!["WND", "NG", "SUN"]);
    }

    #[test]
    fn missing_cells_are_omitted_from_chart_rows() {
        let tidy = vec![
            row(1, 0, "SUN", Some(10.0)),
            row(1, 1, "SUN", None),
            row(1, 1, "WND", Some(5.0)),
        ];
        let out = reshape(&tidy, &select(&["SUN", "WND"]), &config()).unwrap();

        // The 01:00 row key exists (SUN appeared there) but holds no SUN cell.
        assert!(out.wide.rows.contains_key(&hour(1, 1)));
        assert!(!out.wide.rows[&hour(1, 1)].contains_key("SUN"));
        assert_eq!(out.chart.len(), 2);
        assert!(
            !out.chart
                .iter()
                .any(|r| r.category == "SUN" && r.timestamp == hour(1, 1))
        );
    }

    #[test]
    fn zero_policy_fills_missing_cells() {
        let tidy = vec![row(1, 0, "SUN", Some(10.0)), row(1, 1, "WND", Some(5.0))];
        let mut cfg = config();
        cfg.missing = MissingPolicy::Zero;
        let out = reshape(&tidy, &select(&["SUN", "WND"]), &cfg).unwrap();
        // Two timestamps x two categories.
        assert_eq!(out.chart.len(), 4);
        assert!(
            out.chart
                .iter()
                .any(|r| r.category == "SUN" && r.timestamp == hour(1, 1) && r.magnitude == 0.0)
        );
    }

    #[test]
    fn all_missing_category_still_ranks_with_zero_total() {
        let tidy = vec![row(1, 0, "SUN", Some(10.0)), row(1, 0, "OTH", None)];
        let out = reshape(&tidy, &select(&["SUN", "OTH"]), &config()).unwrap();
        let oth = out.totals.iter().find(|t| t.category == "OTH").unwrap();
        assert_eq!(oth.total, 0.0);
        assert!(out.chart.iter().all(|r| r.category != "OTH"));
    }

    #[test]
    fn duplicate_cell_is_rejected_by_default() {
        let tidy = vec![row(1, 0, "SUN", Some(10.0)), row(1, 0, "SUN", Some(12.0))];
        let err = reshape(&tidy, &select(&["SUN"]), &config()).unwrap_err();
        assert!(matches!(err, AppError::MalformedRecord(_)));
    }

    #[test]
    fn duplicate_cell_sums_under_sum_policy() {
        let tidy = vec![row(1, 0, "SUN", Some(10.0)), row(1, 0, "SUN", Some(12.0))];
        let mut cfg = config();
        cfg.duplicates = DuplicatePolicy::Sum;
        let out = reshape(&tidy, &select(&["SUN"]), &cfg).unwrap();
        assert_eq!(out.wide.rows[&hour(1, 0)]["SUN"], 22.0);
    }

    #[test]
    fn duplicate_cell_keeps_last_under_last_wins() {
        let tidy = vec![row(1, 0, "SUN", Some(10.0)), row(1, 0, "SUN", Some(12.0))];
        let mut cfg = config();
        cfg.duplicates = DuplicatePolicy::LastWins;
        let out = reshape(&tidy, &select(&["SUN"]), &cfg).unwrap();
        assert_eq!(out.wide.rows[&hour(1, 0)]["SUN"], 12.0);
    }

    #[test]
    fn duplicate_with_missing_value_does_not_conflict() {
        let tidy = vec![row(1, 0, "SUN", None), row(1, 0, "SUN", Some(12.0))];
        let out = reshape(&tidy, &select(&["SUN"]), &config()).unwrap();
        assert_eq!(out.wide.rows[&hour(1, 0)]["SUN"], 12.0);
    }

    #[test]
    fn sun_wnd_scenario_matches_expected_series_order() {
        // RawRecord equivalents: (T00, SUN, 10), (T00, WND, 5), (T01, SUN, 12).
        let tidy = vec![
            row(1, 0, "SUN", Some(10.0)),
            row(1, 0, "WND", Some(5.0)),
            row(1, 1, "SUN", Some(12.0)),
        ];
        let out = reshape(&tidy, &select(&["SUN", "WND"]), &config()).unwrap();

        let totals: Vec<(&str, f64)> = out
            .totals
            .iter()
            .map(|t| (t.category.as_str(), t.total))
            .collect();
        assert_eq!(totals, vec![("SUN", 22.0), ("WND", 5.0)]);

        // All SUN rows precede the WND rows in declared series order, with
        // magnitudes unchanged.
        let flat: Vec<(&str, f64)> = out
            .chart
            .iter()
            .map(|r| (r.category.as_str(), r.magnitude))
            .collect();
        assert_eq!(
            flat,
            vec![("SUN", 10.0), ("SUN", 12.0), ("WND", 5.0)]
        );
    }
}
