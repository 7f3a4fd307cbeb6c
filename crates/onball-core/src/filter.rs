// Filter pipeline: row selection over an already-ranked dataset.
//
// Filtering only chooses which rows to show. Percentiles, cohorts and the
// dataset itself are never touched.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Deserialize;

use crate::dataset::{CountKind, Dataset, IdentityField, PlayerSeason};

// ---------------------------------------------------------------------------
// Filter specification
// ---------------------------------------------------------------------------

/// Accepted identity values and minimum possession counts.
///
/// An empty set accepts everything. Minimums default to 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSpec {
    pub teams: BTreeSet<String>,
    pub seasons: BTreeSet<String>,
    pub positions: BTreeSet<String>,
    pub players: BTreeSet<String>,
    pub min_drives: u32,
    pub min_picks: u32,
    pub min_isos: u32,
}

impl FilterSpec {
    pub fn accepted(&self, field: IdentityField) -> &BTreeSet<String> {
        match field {
            IdentityField::Player => &self.players,
            IdentityField::Team => &self.teams,
            IdentityField::Season => &self.seasons,
            IdentityField::Position => &self.positions,
        }
    }

    pub fn accepted_mut(&mut self, field: IdentityField) -> &mut BTreeSet<String> {
        match field {
            IdentityField::Player => &mut self.players,
            IdentityField::Team => &mut self.teams,
            IdentityField::Season => &mut self.seasons,
            IdentityField::Position => &mut self.positions,
        }
    }

    pub fn min_for(&self, kind: CountKind) -> u32 {
        match kind {
            CountKind::Drives => self.min_drives,
            CountKind::Picks => self.min_picks,
            CountKind::Isos => self.min_isos,
        }
    }

    pub fn set_min(&mut self, kind: CountKind, value: u32) {
        match kind {
            CountKind::Drives => self.min_drives = value,
            CountKind::Picks => self.min_picks = value,
            CountKind::Isos => self.min_isos = value,
        }
    }

    /// Toggle membership of `value` in the accepted set for `field`.
    /// Returns true if the value is now selected.
    pub fn toggle(&mut self, field: IdentityField, value: &str) -> bool {
        let set = self.accepted_mut(field);
        if set.remove(value) {
            false
        } else {
            set.insert(value.to_string());
            true
        }
    }

    /// True when no filter narrows the dataset.
    pub fn is_unrestricted(&self) -> bool {
        IdentityField::ALL
            .iter()
            .all(|&f| self.accepted(f).is_empty())
            && CountKind::ALL.iter().all(|&k| self.min_for(k) == 0)
    }

    /// Does this record pass every identity and threshold condition?
    pub fn matches(&self, record: &PlayerSeason) -> bool {
        let identity_ok = IdentityField::ALL.iter().all(|&field| {
            let accepted = self.accepted(field);
            accepted.is_empty()
                || record
                    .identity(field)
                    .is_some_and(|value| accepted.contains(value))
        });
        identity_ok
            && CountKind::ALL
                .iter()
                .all(|&kind| record.counts.volume(kind) >= f64::from(self.min_for(kind)))
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Read-only subset of a dataset: the indices of the rows that passed.
#[derive(Debug, Clone)]
pub struct View<'a> {
    dataset: &'a Dataset,
    rows: Vec<usize>,
}

impl<'a> View<'a> {
    /// The unfiltered view of every row.
    pub fn all(dataset: &'a Dataset) -> Self {
        View {
            dataset,
            rows: (0..dataset.len()).collect(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn records(&self) -> impl Iterator<Item = &'a PlayerSeason> + '_ {
        let records = self.dataset.records();
        self.rows.iter().map(move |&i| &records[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Select the rows of `dataset` that satisfy `spec`.
pub fn apply<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> View<'a> {
    let rows = dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| spec.matches(record))
        .map(|(i, _)| i)
        .collect();
    View { dataset, rows }
}

// ---------------------------------------------------------------------------
// Filter options and threshold ranges
// ---------------------------------------------------------------------------

/// Order labels numerically when both parse as numbers, otherwise as text.
/// Seasons like `2023` and `2024` then sort as years, not strings.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Sorted distinct values offered for each identity filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub teams: Vec<String>,
    pub seasons: Vec<String>,
    pub positions: Vec<String>,
    pub players: Vec<String>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let distinct = |field: IdentityField| -> Vec<String> {
            let set: BTreeSet<&str> = dataset
                .records()
                .iter()
                .filter_map(|r| r.identity(field))
                .collect();
            let mut values: Vec<String> = set.into_iter().map(str::to_string).collect();
            values.sort_by(|a, b| compare_labels(a, b));
            values
        };
        FilterOptions {
            teams: distinct(IdentityField::Team),
            seasons: distinct(IdentityField::Season),
            positions: distinct(IdentityField::Position),
            players: distinct(IdentityField::Player),
        }
    }

    pub fn for_field(&self, field: IdentityField) -> &[String] {
        match field {
            IdentityField::Player => &self.players,
            IdentityField::Team => &self.teams,
            IdentityField::Season => &self.seasons,
            IdentityField::Position => &self.positions,
        }
    }
}

/// Slider range for a count threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdRange {
    pub min: u32,
    pub max: u32,
    /// False when there is nothing to threshold on: the range is then the
    /// placeholder `[0, 1]` and the effective minimum is always 0.
    pub enabled: bool,
}

impl ThresholdRange {
    pub const DISABLED: ThresholdRange = ThresholdRange {
        min: 0,
        max: 1,
        enabled: false,
    };

    /// Clamp a requested minimum into the range. A disabled range always
    /// yields 0.
    pub fn clamp(&self, value: u32) -> u32 {
        if self.enabled {
            value.clamp(self.min, self.max)
        } else {
            0
        }
    }
}

/// `[0, max observed]` for a count column, missing counted as 0 and the max
/// truncated to an integer. Disabled when the column is absent or the max is
/// not positive.
pub fn threshold_range(dataset: &Dataset, kind: CountKind) -> ThresholdRange {
    if !dataset.has_count_column(kind) {
        return ThresholdRange::DISABLED;
    }
    let max = dataset
        .records()
        .iter()
        .map(|r| r.counts.volume(kind))
        .fold(0.0_f64, f64::max);
    // `as` saturates, so an infinite count caps at u32::MAX.
    let max = max.trunc() as u32;
    if max == 0 {
        ThresholdRange::DISABLED
    } else {
        ThresholdRange {
            min: 0,
            max,
            enabled: true,
        }
    }
}
