// Interactive filter session over one loaded dataset.
//
// Holds the current `FilterSpec`, the slider ranges and facet options derived
// from the dataset, and the presentation built from them. Every mutation
// re-runs filter + presentation; the dataset and its percentiles are shared
// and never recomputed here.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use onball_core::dataset::IdentityField;
use onball_core::filter::{apply, threshold_range};
use onball_core::{CountKind, Dataset, FilterOptions, FilterSpec, Loaded, Presentation, ThresholdRange};

use crate::protocol::ExportRequest;

pub struct Session {
    loaded: Loaded,
    options: FilterOptions,
    ranges: HashMap<CountKind, ThresholdRange>,
    filters: FilterSpec,
    sort_preference: Vec<String>,
    presentation: Presentation,
}

fn ranges_for(dataset: &Dataset) -> HashMap<CountKind, ThresholdRange> {
    CountKind::ALL
        .iter()
        .map(|&kind| (kind, threshold_range(dataset, kind)))
        .collect()
}

impl Session {
    pub fn new(loaded: Loaded, sort_preference: Vec<String>) -> Self {
        let options = FilterOptions::from_dataset(&loaded.dataset);
        let ranges = ranges_for(&loaded.dataset);
        let filters = FilterSpec::default();
        let presentation = Presentation::build(&apply(&loaded.dataset, &filters), &sort_preference);
        Session {
            loaded,
            options,
            ranges,
            filters,
            sort_preference,
            presentation,
        }
    }

    pub fn loaded(&self) -> &Loaded {
        &self.loaded
    }

    pub fn dataset(&self) -> &Dataset {
        &self.loaded.dataset
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn range(&self, kind: CountKind) -> ThresholdRange {
        self.ranges
            .get(&kind)
            .copied()
            .unwrap_or(ThresholdRange::DISABLED)
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Flip one facet value. Returns true if it is now selected.
    pub fn toggle(&mut self, field: IdentityField, value: &str) -> bool {
        let selected = self.filters.toggle(field, value);
        self.refresh();
        selected
    }

    pub fn clear_field(&mut self, field: IdentityField) {
        self.filters.accepted_mut(field).clear();
        self.refresh();
    }

    /// Set a minimum count, clamped into the slider range.
    pub fn set_threshold(&mut self, kind: CountKind, value: u32) {
        let clamped = self.range(kind).clamp(value);
        self.filters.set_min(kind, clamped);
        self.refresh();
    }

    pub fn adjust_threshold(&mut self, kind: CountKind, delta: i64) {
        let current = i64::from(self.filters.min_for(kind));
        let target = (current + delta).clamp(0, i64::from(u32::MAX));
        self.set_threshold(kind, u32::try_from(target).unwrap_or(0));
    }

    pub fn clear_filters(&mut self) {
        self.filters = FilterSpec::default();
        self.refresh();
    }

    /// Start from a saved filter set instead of the unrestricted one. Values
    /// the dataset does not offer are dropped and thresholds are clamped.
    pub fn with_filters(mut self, filters: FilterSpec) -> Self {
        self.filters = filters;
        self.fit_filters();
        self.refresh();
        self
    }

    /// Swap in a rebuilt dataset. Selections that no longer exist are dropped
    /// and thresholds are clamped into the new ranges.
    pub fn replace_source(&mut self, loaded: Loaded) {
        self.options = FilterOptions::from_dataset(&loaded.dataset);
        self.ranges = ranges_for(&loaded.dataset);
        self.loaded = loaded;
        self.fit_filters();
        self.refresh();
    }

    fn fit_filters(&mut self) {
        for field in IdentityField::ALL {
            let offered = self.options.for_field(field);
            let accepted = self.filters.accepted_mut(field);
            let before = accepted.len();
            accepted.retain(|v| offered.contains(v));
            if accepted.len() != before {
                debug!("dropped {} stale {:?} selections", before - accepted.len(), field);
            }
        }
        for kind in CountKind::ALL {
            let clamped = self.range(kind).clamp(self.filters.min_for(kind));
            self.filters.set_min(kind, clamped);
        }
    }

    pub fn export_request(&self) -> ExportRequest {
        ExportRequest {
            dataset: Arc::clone(&self.loaded.dataset),
            presentation: self.presentation.clone(),
        }
    }

    fn refresh(&mut self) {
        let view = apply(&self.loaded.dataset, &self.filters);
        self.presentation = Presentation::build(&view, &self.sort_preference);
        debug!(
            "view: {} of {} rows",
            self.presentation.len(),
            self.loaded.dataset.len()
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use onball_core::DatasetCache;

    const CSV: &str = "PlayerKey,firstName,lastName,SeasonKey,TeamAbbrev,playerPositionDescription,drives,picks,defensive_impact_iso\n\
                       1,Ann,Lee,2024,BOS,Guard,40,5,2.0\n\
                       2,Bo,Kim,2024,NYK,Guard,60,15,3.0\n\
                       3,Cy,Ray,2024,BOS,Guard,90,25,1.0\n\
                       4,Di,Fox,2024,BOS,Big,10,0,0.5\n";

    fn load(csv: &str) -> Loaded {
        DatasetCache::new().load_bytes("test.csv", csv.as_bytes()).unwrap()
    }

    fn session() -> Session {
        Session::new(load(CSV), vec!["defensive_impact_iso_pct".to_string()])
    }

    fn players(session: &Session) -> Vec<String> {
        session
            .presentation()
            .records(session.dataset())
            .map(|r| r.player.clone())
            .collect()
    }

    #[test]
    fn starts_unfiltered_and_sorted() {
        let s = session();
        assert!(s.filters().is_unrestricted());
        assert_eq!(s.presentation().len(), 4);
        // Guards: Bo 100, Ann 66.7, Cy 33.3. Big: Di 100 (own cohort).
        assert_eq!(players(&s), vec!["Bo Kim", "Di Fox", "Ann Lee", "Cy Ray"]);
    }

    #[test]
    fn toggle_narrows_and_restores() {
        let mut s = session();
        assert!(s.toggle(IdentityField::Team, "NYK"));
        assert_eq!(players(&s), vec!["Bo Kim"]);
        assert!(!s.toggle(IdentityField::Team, "NYK"));
        assert_eq!(s.presentation().len(), 4);
    }

    #[test]
    fn filtering_keeps_cohort_percentiles() {
        let mut s = session();
        let idx = s.dataset().pct_index("defensive_impact_iso_pct").unwrap();
        s.toggle(IdentityField::Player, "Cy Ray");
        let cy = s.presentation().records(s.dataset()).next().unwrap();
        assert_eq!(cy.percentiles[idx], Some(33.3));
    }

    #[test]
    fn thresholds_clamp_into_range() {
        let mut s = session();
        assert_eq!(s.range(CountKind::Drives).max, 90);
        s.set_threshold(CountKind::Drives, 500);
        assert_eq!(s.filters().min_for(CountKind::Drives), 90);
        assert_eq!(players(&s), vec!["Cy Ray"]);

        s.adjust_threshold(CountKind::Drives, -1000);
        assert_eq!(s.filters().min_for(CountKind::Drives), 0);
        assert_eq!(s.presentation().len(), 4);
    }

    #[test]
    fn absent_count_column_stays_disabled() {
        let mut s = session();
        let isos = s.range(CountKind::Isos);
        assert!(!isos.enabled);
        s.adjust_threshold(CountKind::Isos, 10);
        assert_eq!(s.filters().min_for(CountKind::Isos), 0);
        assert_eq!(s.presentation().len(), 4);
    }

    #[test]
    fn clear_filters_resets_everything() {
        let mut s = session();
        s.toggle(IdentityField::Position, "Big");
        s.set_threshold(CountKind::Picks, 3);
        assert!(s.presentation().is_empty());
        s.clear_filters();
        assert!(s.filters().is_unrestricted());
        assert_eq!(s.presentation().len(), 4);
    }

    #[test]
    fn clear_field_only_touches_that_facet() {
        let mut s = session();
        s.toggle(IdentityField::Team, "BOS");
        s.toggle(IdentityField::Position, "Guard");
        s.clear_field(IdentityField::Team);
        assert!(s.filters().teams.is_empty());
        assert_eq!(s.filters().positions.len(), 1);
        assert_eq!(s.presentation().len(), 3);
    }

    #[test]
    fn replace_source_prunes_stale_selections() {
        let mut s = session();
        s.toggle(IdentityField::Team, "NYK");
        s.toggle(IdentityField::Team, "BOS");
        s.set_threshold(CountKind::Drives, 80);

        let smaller = "PlayerKey,firstName,lastName,SeasonKey,TeamAbbrev,playerPositionDescription,drives,defensive_impact_iso\n\
                       1,Ann,Lee,2024,BOS,Guard,40,2.0\n\
                       3,Cy,Ray,2024,BOS,Guard,50,1.0\n";
        s.replace_source(load(smaller));

        assert_eq!(
            s.filters().teams.iter().collect::<Vec<_>>(),
            vec!["BOS"]
        );
        assert_eq!(s.filters().min_for(CountKind::Drives), 50);
        assert!(!s.range(CountKind::Picks).enabled);
        assert_eq!(players(&s), vec!["Cy Ray"]);
    }

    #[test]
    fn startup_filters_are_fitted_to_dataset() {
        let mut initial = FilterSpec::default();
        initial.teams.insert("BOS".to_string());
        initial.teams.insert("SEA".to_string());
        initial.min_drives = 1000;
        initial.min_picks = 20;

        let s = session().with_filters(initial);
        assert_eq!(s.filters().teams.iter().collect::<Vec<_>>(), vec!["BOS"]);
        assert_eq!(s.filters().min_for(CountKind::Drives), 90);
        assert_eq!(s.filters().min_for(CountKind::Picks), 20);
        assert_eq!(players(&s), vec!["Cy Ray"]);
    }

    #[test]
    fn export_request_matches_screen() {
        let mut s = session();
        s.toggle(IdentityField::Team, "BOS");
        let request = s.export_request();
        assert_eq!(request.presentation, *s.presentation());
        assert!(Arc::ptr_eq(&request.dataset, &s.loaded().dataset));
    }
}
