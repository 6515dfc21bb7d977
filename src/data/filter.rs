use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{CleanRecord, Product, Region, SalesDataset};

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// What an empty multi-select means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptySelection {
    /// Empty set → no restriction on that dimension.
    #[default]
    SelectAll,
    /// Empty set → nothing passes.
    SelectNone,
}

/// Product / region / year selections plus the World toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub products: BTreeSet<Product>,
    pub regions: BTreeSet<Region>,
    pub years: BTreeSet<i32>,
    /// Keep the `World` aggregate rows.
    pub include_world: bool,
    pub empty_selection: EmptySelection,
}

impl FilterCriteria {
    /// The dashboard's opening selection: both products, every region
    /// except World, every year, World aggregate hidden.
    pub fn defaults_for(dataset: &SalesDataset) -> Self {
        FilterCriteria {
            products: Product::ALL.into_iter().collect(),
            regions: dataset
                .regions
                .iter()
                .copied()
                .filter(|r| *r != Region::World)
                .collect(),
            years: dataset.years.clone(),
            include_world: false,
            empty_selection: EmptySelection::SelectAll,
        }
    }

    /// Whether a single record passes every predicate.
    pub fn matches(&self, rec: &CleanRecord) -> bool {
        (self.include_world || rec.region != Region::World)
            && self.allows(&self.products, &rec.product)
            && self.allows(&self.regions, &rec.region)
            && self.allows(&self.years, &rec.year)
    }

    fn allows<T: Ord>(&self, selected: &BTreeSet<T>, value: &T) -> bool {
        if selected.is_empty() {
            return self.empty_selection == EmptySelection::SelectAll;
        }
        selected.contains(value)
    }
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Return an independent copy of the records passing all predicates, in
/// dataset order.
pub fn apply(dataset: &SalesDataset, criteria: &FilterCriteria) -> Vec<CleanRecord> {
    dataset
        .records
        .iter()
        .filter(|rec| criteria.matches(rec))
        .cloned()
        .collect()
}
