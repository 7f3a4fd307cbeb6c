// Percentile engine for per-player, per-season tracking statistics.
//
// Pipeline: source -> schema -> classify -> percentile (population frozen in
// `Dataset::build`) -> filter (view-only) -> presentation.

pub mod cache;
pub mod classify;
pub mod dataset;
pub mod export;
pub mod filter;
pub mod percentile;
pub mod presentation;
pub mod schema;
pub mod source;
pub mod table;

pub use cache::{DatasetCache, Loaded};
pub use dataset::{CountKind, Dataset, PlayerSeason};
pub use filter::{FilterOptions, FilterSpec, ThresholdRange, View};
pub use presentation::Presentation;
