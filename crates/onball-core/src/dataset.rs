// The percentile-augmented dataset: built once per source, read-only after.

use tracing::info;

use crate::classify::{self, coerce_number, Classified, ColumnKind, ColumnProfile};
use crate::percentile::{self, PercentileColumn};
use crate::schema::{self, SchemaError, PLAYER, PLAYER_KEY, POSITION, SEASON_KEY, TEAM};
use crate::table::Table;

// ---------------------------------------------------------------------------
// Count-type columns
// ---------------------------------------------------------------------------

/// The possession-volume columns usable as minimum thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountKind {
    Drives,
    Picks,
    Isos,
}

impl CountKind {
    pub const ALL: [CountKind; 3] = [CountKind::Drives, CountKind::Picks, CountKind::Isos];

    /// Source column name.
    pub fn column(self) -> &'static str {
        match self {
            CountKind::Drives => "drives",
            CountKind::Picks => "picks",
            CountKind::Isos => "isos",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CountKind::Drives => "Drives",
            CountKind::Picks => "Picks",
            CountKind::Isos => "ISOs",
        }
    }
}

/// Raw possession counts for one record. `None` when missing, unparseable or
/// when the column is absent from the source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CountVolumes {
    pub drives: Option<f64>,
    pub picks: Option<f64>,
    pub isos: Option<f64>,
}

impl CountVolumes {
    pub fn get(&self, kind: CountKind) -> Option<f64> {
        match kind {
            CountKind::Drives => self.drives,
            CountKind::Picks => self.picks,
            CountKind::Isos => self.isos,
        }
    }

    /// Count used for threshold comparison: missing counts as 0.
    pub fn volume(&self, kind: CountKind) -> f64 {
        self.get(kind).unwrap_or(0.0)
    }

    fn set(&mut self, kind: CountKind, value: Option<f64>) {
        match kind {
            CountKind::Drives => self.drives = value,
            CountKind::Picks => self.picks = value,
            CountKind::Isos => self.isos = value,
        }
    }
}

// ---------------------------------------------------------------------------
// Identity fields
// ---------------------------------------------------------------------------

/// Identity fields that filters match on and the table displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Player,
    Team,
    Season,
    Position,
}

impl IdentityField {
    /// Display order.
    pub const ALL: [IdentityField; 4] = [
        IdentityField::Player,
        IdentityField::Team,
        IdentityField::Season,
        IdentityField::Position,
    ];

    pub fn column(self) -> &'static str {
        match self {
            IdentityField::Player => PLAYER,
            IdentityField::Team => TEAM,
            IdentityField::Season => SEASON_KEY,
            IdentityField::Position => POSITION,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One (player, season) observation with its frozen percentiles.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSeason {
    pub player: String,
    pub player_key: Option<String>,
    pub team: Option<String>,
    pub season: Option<String>,
    pub position: Option<String>,
    pub counts: CountVolumes,
    /// Aligned with `Dataset::pct_fields`.
    pub percentiles: Vec<Option<f64>>,
}

impl PlayerSeason {
    pub fn identity(&self, field: IdentityField) -> Option<&str> {
        match field {
            IdentityField::Player => Some(self.player.as_str()),
            IdentityField::Team => self.team.as_deref(),
            IdentityField::Season => self.season.as_deref(),
            IdentityField::Position => self.position.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Normalized, classified and percentile-augmented records.
///
/// There are no mutating methods: once built, filters and the presentation
/// layer only ever read it (usually through an `Arc<Dataset>`).
#[derive(Debug, Clone)]
pub struct Dataset {
    profiles: Vec<ColumnProfile>,
    metrics: Vec<String>,
    pct_fields: Vec<String>,
    count_columns: Vec<CountKind>,
    cohort_count: usize,
    records: Vec<PlayerSeason>,
}

impl Dataset {
    /// Run the whole pipeline over a loaded table: normalize, classify,
    /// rank every eligible metric within its full cohort.
    pub fn build(raw: &Table) -> Result<Self, SchemaError> {
        let normalized = schema::normalize(raw)?;
        let classified = classify::classify(normalized);
        let percentiles = percentile::compute(&classified);
        let dataset = Self::assemble(classified, percentiles);
        info!(
            "built dataset: {} rows, {} cohorts, {} percentile fields, {} skipped candidates",
            dataset.len(),
            dataset.cohort_count,
            dataset.pct_fields.len(),
            dataset.skipped_candidates().len()
        );
        Ok(dataset)
    }

    fn assemble(classified: Classified, percentiles: Vec<PercentileColumn>) -> Self {
        let table = &classified.table;
        let col = |name: &str| table.column_index(name);
        let player = col(PLAYER);
        let player_key = col(PLAYER_KEY);
        let team = col(TEAM);
        let season = col(SEASON_KEY);
        let position = col(POSITION);
        let counts: Vec<(CountKind, usize)> = CountKind::ALL
            .iter()
            .filter_map(|&k| col(k.column()).map(|idx| (k, idx)))
            .collect();

        let text = |row: usize, idx: Option<usize>| -> Option<String> {
            idx.and_then(|c| table.cell(row, c)).map(str::to_string)
        };

        let records = (0..table.len())
            .map(|row| {
                let mut volumes = CountVolumes::default();
                for &(kind, idx) in &counts {
                    volumes.set(kind, coerce_number(table.cell(row, idx)));
                }
                PlayerSeason {
                    player: text(row, player).unwrap_or_default(),
                    player_key: text(row, player_key),
                    team: text(row, team),
                    season: text(row, season),
                    position: text(row, position),
                    counts: volumes,
                    percentiles: percentiles.iter().map(|p| p.values[row]).collect(),
                }
            })
            .collect();

        let cohort_count = percentile::group_cohorts(&percentile::cohort_keys(table)).len();

        Dataset {
            metrics: percentiles.iter().map(|p| p.metric.clone()).collect(),
            pct_fields: percentiles.iter().map(|p| p.field.clone()).collect(),
            count_columns: counts.iter().map(|&(k, _)| k).collect(),
            profiles: classified.profiles,
            cohort_count,
            records,
        }
    }

    pub fn records(&self) -> &[PlayerSeason] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Metrics that received a percentile field, in source column order.
    pub fn eligible_metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Percentile field names (`<metric>_pct`), aligned with each record's
    /// `percentiles`.
    pub fn pct_fields(&self) -> &[String] {
        &self.pct_fields
    }

    pub fn pct_index(&self, field: &str) -> Option<usize> {
        self.pct_fields.iter().position(|f| f == field)
    }

    /// Classification of every column after normalization.
    pub fn column_profiles(&self) -> &[ColumnProfile] {
        &self.profiles
    }

    pub fn column_kind(&self, column: &str) -> Option<ColumnKind> {
        self.profiles.iter().find(|p| p.name == column).map(|p| p.kind)
    }

    /// Metric candidates excluded because no value was numeric.
    pub fn skipped_candidates(&self) -> Vec<&str> {
        self.profiles
            .iter()
            .filter(|p| p.kind == ColumnKind::Metric && !p.is_eligible())
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn has_count_column(&self, kind: CountKind) -> bool {
        self.count_columns.contains(&kind)
    }

    pub fn cohort_count(&self) -> usize {
        self.cohort_count
    }
}
