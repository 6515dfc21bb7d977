//! # Rusty Tractor - tractor & mower unit-sales analytics
//!
//! Turns a PLE-style sales workbook (two loosely formatted sheets, one per
//! product) into a tidy dataset, then filters it and computes the KPIs and
//! tables a dashboard displays.
//!
//! ```text
//! workbook ──▶ load ──▶ SalesDataset ──▶ filter ──▶ Vec<CleanRecord> ──▶ metrics / export_csv
//! ```
//!
//! ## Modules
//!
//! - [`data`] - cell model, sheet normalization, loading, filtering, export, cache
//! - [`metrics`] - KPIs, time series, seasonality, pivot
//! - [`state`] - headless dashboard session
//! - [`config`] - file / environment configuration
//! - [`error`] - error types

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod state;

pub use data::filter::{EmptySelection, FilterCriteria};
pub use data::loader::{resolve_source, SheetNames, Source};
pub use data::model::{CellValue, CleanRecord, Product, RawSheet, Region, SalesDataset};
pub use error::{DashboardError, SheetShapeError};
pub use metrics::MetricsSnapshot;
pub use state::DashboardState;

/// Load the unified dataset from an upload or a file.
pub fn load(source: &Source) -> error::Result<SalesDataset> {
    data::loader::load(source)
}

/// Independent copy of the records passing `criteria`.
pub fn filter(dataset: &SalesDataset, criteria: &FilterCriteria) -> Vec<CleanRecord> {
    data::filter::apply(dataset, criteria)
}

/// KPIs and views for a filtered record set.
pub fn metrics(filtered: &[CleanRecord]) -> MetricsSnapshot {
    MetricsSnapshot::compute(filtered)
}

/// CSV bytes (`Month, Region, Units, Product, Year, MonthName`).
pub fn export_csv(filtered: &[CleanRecord]) -> error::Result<Vec<u8>> {
    data::export::export_csv(filtered)
}
