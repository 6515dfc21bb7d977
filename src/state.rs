use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::cache::DatasetCache;
use crate::data::export::export_csv;
use crate::data::filter::{apply, FilterCriteria};
use crate::data::loader::Source;
use crate::data::model::{CleanRecord, Product, Region, SalesDataset};
use crate::error::Result;
use crate::metrics::MetricsSnapshot;

// ---------------------------------------------------------------------------
// Dashboard session state
// ---------------------------------------------------------------------------

/// Everything a dashboard front-end needs, independent of rendering.
#[derive(Debug)]
pub struct DashboardState {
    /// Loaded datasets keyed by source identity.
    cache: DatasetCache,

    /// Current unified dataset (None until a source loads).
    pub dataset: Option<Arc<SalesDataset>>,

    /// Current selections.
    pub criteria: FilterCriteria,

    /// Records passing `criteria` (an independent copy).
    pub filtered: Vec<CleanRecord>,

    /// KPIs and views for `filtered`.
    pub snapshot: MetricsSnapshot,

    /// Status / error message for the user.
    pub status_message: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(&DashboardConfig::default())
    }
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            cache: DatasetCache::with_sheet_names(config.sheets.clone()),
            dataset: None,
            criteria: FilterCriteria::default(),
            filtered: Vec::new(),
            snapshot: MetricsSnapshot::compute(&[]),
            status_message: None,
        }
    }

    /// Load (or fetch from cache) a source and reset the filters to the
    /// dashboard defaults. On failure the previous dataset stays in place.
    pub fn load_source(&mut self, source: &Source) -> Result<()> {
        match self.cache.get_or_load(source) {
            Ok(dataset) => {
                self.set_dataset(dataset);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", source.describe());
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Ingest a dataset and initialise the filters.
    pub fn set_dataset(&mut self, dataset: Arc<SalesDataset>) {
        self.criteria = FilterCriteria {
            empty_selection: self.criteria.empty_selection,
            ..FilterCriteria::defaults_for(&dataset)
        };
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the filtered copy and the snapshot from scratch.
    pub fn refilter(&mut self) {
        self.filtered = match &self.dataset {
            Some(ds) => apply(ds, &self.criteria),
            None => Vec::new(),
        };
        self.snapshot = MetricsSnapshot::compute(&self.filtered);
        log::debug!(
            "refiltered: {} of {} records",
            self.filtered.len(),
            self.dataset.as_ref().map_or(0, |d| d.len())
        );
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.refilter();
    }

    pub fn toggle_product(&mut self, product: Product) {
        toggle(&mut self.criteria.products, product);
        self.refilter();
    }

    pub fn toggle_region(&mut self, region: Region) {
        toggle(&mut self.criteria.regions, region);
        self.refilter();
    }

    pub fn toggle_year(&mut self, year: i32) {
        toggle(&mut self.criteria.years, year);
        self.refilter();
    }

    /// Select every region present in the dataset.
    pub fn select_all_regions(&mut self) {
        if let Some(ds) = &self.dataset {
            self.criteria.regions = ds.regions.clone();
            self.refilter();
        }
    }

    /// Clear the region selection.
    pub fn select_no_regions(&mut self) {
        self.criteria.regions.clear();
        self.refilter();
    }

    pub fn set_include_world(&mut self, include: bool) {
        self.criteria.include_world = include;
        self.refilter();
    }

    /// CSV of the current filtered records.
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        export_csv(&self.filtered)
    }

    pub fn cached_sources(&self) -> usize {
        self.cache.len()
    }
}

fn toggle<T: Ord>(set: &mut std::collections::BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::EmptySelection;
    use crate::data::sample::{sample_workbook, SampleOptions};

    fn loaded() -> DashboardState {
        let opts = SampleOptions {
            years: 2,
            ..Default::default()
        };
        let mut state = DashboardState::default();
        state
            .load_source(&Source::Uploaded {
                name: "sample.xlsx".to_string(),
                bytes: sample_workbook(&opts).unwrap(),
            })
            .unwrap();
        state
    }

    #[test]
    fn starts_empty() {
        let state = DashboardState::default();
        assert!(state.dataset.is_none());
        assert!(state.snapshot.is_empty());
        assert_eq!(state.cached_sources(), 0);
    }

    #[test]
    fn load_applies_default_filters() {
        let state = loaded();
        assert!(state.filtered.iter().all(|r| r.region != Region::World));
        assert_eq!(state.snapshot.record_count, state.filtered.len());
        assert!(state.snapshot.year_over_year.is_some());
        assert_eq!(state.cached_sources(), 1);
    }

    #[test]
    fn toggles_recompute_everything() {
        let mut state = loaded();
        let all = state.filtered.len();

        state.toggle_product(Product::Tractor);
        assert!(state.filtered.iter().all(|r| r.product == Product::Mower));
        assert_eq!(state.snapshot.tractor_share, Some(0.0));

        state.toggle_product(Product::Tractor);
        assert_eq!(state.filtered.len(), all);

        state.toggle_year(2015);
        assert!(state.filtered.iter().all(|r| r.year == 2014));
        assert!(state.snapshot.year_over_year.is_none());

        state.set_include_world(true);
        state.select_all_regions();
        assert!(state.filtered.iter().any(|r| r.region == Region::World));
    }

    #[test]
    fn region_selection_follows_empty_policy() {
        let mut state = loaded();
        state.select_no_regions();
        assert!(!state.filtered.is_empty());

        let criteria = FilterCriteria {
            empty_selection: EmptySelection::SelectNone,
            ..state.criteria.clone()
        };
        state.set_criteria(criteria);
        assert!(state.filtered.is_empty());
        assert!(state.snapshot.is_empty());
        let csv = String::from_utf8(state.export_csv().unwrap()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut state = loaded();
        let before = state.filtered.len();
        let err = state.load_source(&Source::Path("/definitely/not/here.xlsx".into()));
        assert!(err.is_err());
        assert!(state.status_message.is_some());
        assert_eq!(state.filtered.len(), before);
    }
}
