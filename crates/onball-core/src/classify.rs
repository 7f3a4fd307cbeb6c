// Metric classification: each column is tagged once as Identity, CountType or
// Metric, and metric candidates are coerced to numbers.

use tracing::{debug, warn};

use crate::schema::{PLAYER_KEY, POSITION, SEASON_KEY};
use crate::table::Table;

/// Possession-volume columns. Used only as filter thresholds, never ranked.
pub const COUNT_COLUMNS: [&str; 3] = ["drives", "picks", "isos"];

/// Key and grouping columns, never ranked.
pub const IDENTITY_COLUMNS: [&str; 3] = [SEASON_KEY, PLAYER_KEY, POSITION];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Identity,
    CountType,
    Metric,
}

impl ColumnKind {
    pub fn of(column: &str) -> Self {
        if IDENTITY_COLUMNS.contains(&column) {
            ColumnKind::Identity
        } else if COUNT_COLUMNS.contains(&column) {
            ColumnKind::CountType
        } else {
            ColumnKind::Metric
        }
    }
}

/// Classification metadata carried alongside the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Number of cells that coerced to a number. Only counted for metric candidates.
    pub numeric_count: usize,
}

impl ColumnProfile {
    /// A metric candidate with at least one numeric value.
    pub fn is_eligible(&self) -> bool {
        self.kind == ColumnKind::Metric && self.numeric_count > 0
    }
}

/// A metric column promoted to percentile ranking, with its coerced values.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// The classified table: the table itself, per-column profiles, and the
/// eligible metrics in first-encountered column order.
#[derive(Debug, Clone)]
pub struct Classified {
    pub table: Table,
    pub profiles: Vec<ColumnProfile>,
    pub metrics: Vec<MetricColumn>,
}

impl Classified {
    pub fn eligible_metrics(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name.as_str()).collect()
    }

    /// Metric candidates that had no numeric value and were left out of ranking.
    pub fn skipped(&self) -> Vec<&str> {
        self.profiles
            .iter()
            .filter(|p| p.kind == ColumnKind::Metric && p.numeric_count == 0)
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// Locale-free numeric coercion. Anything that does not parse as an `f64`
/// (and NaN itself) is missing.
pub fn coerce_number(cell: Option<&str>) -> Option<f64> {
    let value: f64 = cell?.trim().parse().ok()?;
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Classify every column and coerce the metric candidates.
pub fn classify(table: Table) -> Classified {
    let mut profiles = Vec::with_capacity(table.columns().len());
    let mut metrics = Vec::new();

    for (idx, name) in table.columns().iter().enumerate() {
        let kind = ColumnKind::of(name);
        if kind != ColumnKind::Metric {
            profiles.push(ColumnProfile {
                name: name.clone(),
                kind,
                numeric_count: 0,
            });
            continue;
        }

        let values: Vec<Option<f64>> = table
            .rows()
            .iter()
            .map(|row| coerce_number(row[idx].as_deref()))
            .collect();
        let numeric_count = values.iter().filter(|v| v.is_some()).count();

        if numeric_count > 0 {
            debug!(
                "metric `{}`: {}/{} numeric values",
                name,
                numeric_count,
                values.len()
            );
            metrics.push(MetricColumn {
                name: name.clone(),
                values,
            });
        } else if !table.is_empty() {
            debug!("column `{}` has no numeric values; not ranked", name);
        }

        profiles.push(ColumnProfile {
            name: name.clone(),
            kind,
            numeric_count,
        });
    }

    if metrics.is_empty() && !table.is_empty() {
        warn!("no column qualified for percentile ranking");
    }

    Classified {
        table,
        profiles,
        metrics,
    }
}
