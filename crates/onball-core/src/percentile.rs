// Percentile ranking within (season, position) cohorts.
//
// Ranks are computed over the whole loaded population. Nothing in here knows
// about filters; `Dataset::build` runs this before a `View` can exist.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::classify::Classified;
use crate::schema::{POSITION, SEASON_KEY};
use crate::table::Table;

/// Suffix appended to a metric name to form its percentile field.
pub const PCT_SUFFIX: &str = "_pct";

pub fn pct_field_name(metric: &str) -> String {
    format!("{metric}{PCT_SUFFIX}")
}

/// Reference population key. A missing season or position is its own value,
/// so rows with missing keys still form a cohort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CohortKey {
    pub season: Option<String>,
    pub position: Option<String>,
}

/// Percentiles for one metric, one entry per table row.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileColumn {
    pub metric: String,
    pub field: String,
    pub values: Vec<Option<f64>>,
}

/// Round to one decimal place, ties to even.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round_ties_even() / 10.0
}

/// Cohort key of every row.
pub fn cohort_keys(table: &Table) -> Vec<CohortKey> {
    let season = table.column_index(SEASON_KEY);
    let position = table.column_index(POSITION);
    (0..table.len())
        .map(|row| CohortKey {
            season: season.and_then(|c| table.cell(row, c)).map(str::to_string),
            position: position.and_then(|c| table.cell(row, c)).map(str::to_string),
        })
        .collect()
}

/// Row indices per cohort, in row order within each cohort.
pub fn group_cohorts(keys: &[CohortKey]) -> BTreeMap<&CohortKey, Vec<usize>> {
    let mut groups: BTreeMap<&CohortKey, Vec<usize>> = BTreeMap::new();
    for (row, key) in keys.iter().enumerate() {
        groups.entry(key).or_default().push(row);
    }
    groups
}

/// Average-rank percentiles for one cohort's values.
///
/// Each non-missing value gets `round1(rank / n * 100)` where `rank` is its
/// 1-based ascending position (tied values share the mean of the positions
/// they span) and `n` counts the non-missing values. Missing stays missing.
pub fn rank_percentiles(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut present: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|x| (i, x)))
        .collect();
    present.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let n = present.len() as f64;
    let mut out = vec![None; values.len()];
    let mut start = 0;
    while start < present.len() {
        let mut end = start + 1;
        while end < present.len() && present[end].1 == present[start].1 {
            end += 1;
        }
        // Positions start+1..=end, mean of the run.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let pct = round1(avg_rank / n * 100.0);
        for &(row, _) in &present[start..end] {
            out[row] = Some(pct);
        }
        start = end;
    }
    out
}

/// Compute one percentile column per eligible metric over the full table.
pub fn compute(classified: &Classified) -> Vec<PercentileColumn> {
    let keys = cohort_keys(&classified.table);
    let cohorts = group_cohorts(&keys);

    classified
        .metrics
        .iter()
        .map(|metric| {
            let mut values = vec![None; metric.values.len()];
            for rows in cohorts.values() {
                let cohort_values: Vec<Option<f64>> =
                    rows.iter().map(|&r| metric.values[r]).collect();
                for (&row, pct) in rows.iter().zip(rank_percentiles(&cohort_values)) {
                    values[row] = pct;
                }
            }
            PercentileColumn {
                metric: metric.name.clone(),
                field: pct_field_name(&metric.name),
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn ties_share_average_rank() {
        let pct = rank_percentiles(&some(&[10.0, 10.0, 20.0, 30.0]));
        assert_eq!(pct, vec![Some(37.5), Some(37.5), Some(75.0), Some(100.0)]);
    }

    #[test]
    fn distinct_values_rank_by_position() {
        let pct = rank_percentiles(&some(&[3.0, 1.0, 2.0]));
        assert_eq!(pct, vec![Some(100.0), Some(33.3), Some(66.7)]);
    }

    #[test]
    fn all_equal_values_share_the_middle() {
        let pct = rank_percentiles(&some(&[5.0, 5.0, 5.0]));
        assert_eq!(pct, vec![Some(66.7); 3]);
    }

    #[test]
    fn missing_values_stay_missing_and_do_not_count() {
        let pct = rank_percentiles(&[Some(1.0), None, Some(2.0)]);
        assert_eq!(pct, vec![Some(50.0), None, Some(100.0)]);
    }

    #[test]
    fn single_value_is_top_of_its_cohort() {
        assert_eq!(rank_percentiles(&[Some(-4.0)]), vec![Some(100.0)]);
    }

    #[test]
    fn empty_and_all_missing() {
        assert!(rank_percentiles(&[]).is_empty());
        assert_eq!(rank_percentiles(&[None, None]), vec![None, None]);
    }

    #[test]
    fn round1_ties_to_even() {
        assert_eq!(round1(12.25), 12.2);
        assert_eq!(round1(37.5), 37.5);
        assert_eq!(round1(66.666), 66.7);
    }

    #[test]
    fn field_names_use_suffix() {
        assert_eq!(pct_field_name("pts_per_poss"), "pts_per_poss_pct");
    }

    #[test]
    fn cohorts_split_by_season_and_position() {
        let table = Table::from_strs(
            &["SeasonKey", "playerPositionDescription", "ppp"],
            &[
                &["2024", "Guard", "1"],
                &["2024", "Guard", "2"],
                &["2024", "Big", "100"],
                &["2023", "Guard", "50"],
            ],
        );
        let pct = compute(&classify(table));
        assert_eq!(pct.len(), 1);
        assert_eq!(pct[0].field, "ppp_pct");
        assert_eq!(
            pct[0].values,
            vec![Some(50.0), Some(100.0), Some(100.0), Some(100.0)]
        );
    }

    #[test]
    fn missing_keys_form_their_own_cohort() {
        let table = Table::from_strs(
            &["SeasonKey", "playerPositionDescription", "ppp"],
            &[
                &["2024", "", "1"],
                &["2024", "", "3"],
                &["2024", "Guard", "2"],
                &["", "Guard", "9"],
            ],
        );
        let pct = compute(&classify(table));
        assert_eq!(
            pct[0].values,
            vec![Some(50.0), Some(100.0), Some(100.0), Some(100.0)]
        );
    }

    #[test]
    fn cohort_keys_read_both_columns() {
        let table = Table::from_strs(
            &["SeasonKey", "playerPositionDescription"],
            &[&["2024", "Wing"], &["", "Wing"]],
        );
        let keys = cohort_keys(&table);
        assert_eq!(keys[0].season.as_deref(), Some("2024"));
        assert_eq!(keys[1].season, None);
        assert_eq!(group_cohorts(&keys).len(), 2);
    }
}
