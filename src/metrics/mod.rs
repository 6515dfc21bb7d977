//! Read-only KPIs and aggregation views over a filtered record set.
//!
//! Every function accepts an empty slice and answers with `0`, `None` or an
//! empty collection instead of failing.

pub mod views;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::{CleanRecord, Product, Region};

pub use views::{
    pivot, product_comparison, seasonality, time_series, PivotColumnKey, PivotRowKey, PivotTable,
    ProductPoint, SeasonalityCell, TimeSeriesPoint,
};

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

/// Latest year against the year before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearOverYear {
    pub latest_year: i32,
    pub prior_year: i32,
    pub latest_units: i64,
    pub prior_units: i64,
    /// `latest_units - prior_units`.
    pub delta: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopRegion {
    pub region: Region,
    pub units: i64,
}

fn sum_units<'a>(rows: impl IntoIterator<Item = &'a CleanRecord>) -> f64 {
    rows.into_iter().map(|r| r.units).sum()
}

/// Sum of units, truncated to a whole count.
pub fn total_units(rows: &[CleanRecord]) -> i64 {
    sum_units(rows) as i64
}

pub fn latest_year(rows: &[CleanRecord]) -> Option<i32> {
    rows.iter().map(|r| r.year).max()
}

/// `None` unless the year before the latest one has rows too.
pub fn year_over_year(rows: &[CleanRecord]) -> Option<YearOverYear> {
    let latest_year = latest_year(rows)?;
    let prior_year = latest_year - 1;
    if !rows.iter().any(|r| r.year == prior_year) {
        return None;
    }

    let units_in = |year: i32| sum_units(rows.iter().filter(|r| r.year == year)) as i64;
    let latest_units = units_in(latest_year);
    let prior_units = units_in(prior_year);
    Some(YearOverYear {
        latest_year,
        prior_year,
        latest_units,
        prior_units,
        delta: latest_units - prior_units,
    })
}

/// Region with the highest total; ties go to the alphabetically first name.
pub fn top_region(rows: &[CleanRecord]) -> Option<TopRegion> {
    let mut totals: BTreeMap<Region, f64> = BTreeMap::new();
    for rec in rows {
        *totals.entry(rec.region).or_default() += rec.units;
    }

    // BTreeMap walks regions alphabetically; only a strictly larger total
    // replaces the current best.
    totals
        .into_iter()
        .fold(None, |best: Option<(Region, f64)>, (region, units)| match best {
            Some((_, best_units)) if best_units >= units => best,
            _ => Some((region, units)),
        })
        .map(|(region, units)| TopRegion {
            region,
            units: units as i64,
        })
}

/// Percentage of total units per product. Both products are always present;
/// all shares are 0 when the total is 0.
pub fn product_share(rows: &[CleanRecord]) -> BTreeMap<Product, f64> {
    let total = sum_units(rows);
    Product::ALL
        .into_iter()
        .map(|product| {
            let share = if total > 0.0 {
                sum_units(rows.iter().filter(|r| r.product == product)) / total * 100.0
            } else {
                0.0
            };
            (product, share)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything a dashboard shows for one filter state. Recomputed on every
/// filter change, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub record_count: usize,
    pub total_units: i64,
    pub latest_year: Option<i32>,
    pub year_over_year: Option<YearOverYear>,
    pub top_region: Option<TopRegion>,
    pub product_share: BTreeMap<Product, f64>,
    /// Tractor share headline; `None` when nothing is selected.
    pub tractor_share: Option<f64>,
    pub time_series: Vec<TimeSeriesPoint>,
    pub product_comparison: Vec<ProductPoint>,
    pub seasonality: Vec<SeasonalityCell>,
    pub pivot: PivotTable,
}

impl MetricsSnapshot {
    pub fn compute(rows: &[CleanRecord]) -> Self {
        let product_share = product_share(rows);
        let tractor_share = if rows.is_empty() {
            None
        } else {
            product_share.get(&Product::Tractor).copied()
        };

        MetricsSnapshot {
            record_count: rows.len(),
            total_units: total_units(rows),
            latest_year: latest_year(rows),
            year_over_year: year_over_year(rows),
            top_region: top_region(rows),
            product_share,
            tractor_share,
            time_series: time_series(rows),
            product_comparison: product_comparison(rows),
            seasonality: seasonality(rows),
            pivot: pivot(rows),
        }
    }

    /// True when the filters left nothing to show.
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn rec(y: i32, region: Region, product: Product, units: f64) -> CleanRecord {
        CleanRecord::new(NaiveDate::from_ymd_opt(y, 6, 1).unwrap(), region, product, units)
    }

    #[test]
    fn totals_and_latest_year() {
        let rows = vec![
            rec(2019, Region::China, Product::Mower, 1.5),
            rec(2021, Region::China, Product::Mower, 2.0),
        ];
        assert_eq!(total_units(&rows), 3);
        assert_eq!(latest_year(&rows), Some(2021));
        assert_eq!(total_units(&[]), 0);
        assert_eq!(latest_year(&[]), None);
    }

    #[test]
    fn year_over_year_needs_previous_year() {
        let gap = vec![
            rec(2019, Region::China, Product::Mower, 10.0),
            rec(2021, Region::China, Product::Mower, 20.0),
        ];
        assert_eq!(year_over_year(&gap), None);
        assert_eq!(year_over_year(&[]), None);

        let adjacent = vec![
            rec(2020, Region::China, Product::Mower, 30.0),
            rec(2021, Region::China, Product::Mower, 20.0),
            rec(2021, Region::Europe, Product::Tractor, 5.0),
        ];
        assert_eq!(
            year_over_year(&adjacent),
            Some(YearOverYear {
                latest_year: 2021,
                prior_year: 2020,
                latest_units: 25,
                prior_units: 30,
                delta: -5,
            })
        );
    }

    #[test]
    fn top_region_ties_resolve_alphabetically() {
        let rows = vec![
            rec(2020, Region::Pacific, Product::Mower, 100.0),
            rec(2020, Region::Europe, Product::Mower, 100.0),
            rec(2020, Region::China, Product::Mower, 40.0),
        ];
        for _ in 0..3 {
            assert_eq!(
                top_region(&rows),
                Some(TopRegion {
                    region: Region::Europe,
                    units: 100
                })
            );
        }
        assert_eq!(top_region(&[]), None);
    }

    #[test]
    fn top_region_sums_across_rows() {
        let rows = vec![
            rec(2020, Region::SouthAmerica, Product::Mower, 60.0),
            rec(2021, Region::SouthAmerica, Product::Tractor, 60.0),
            rec(2020, Region::China, Product::Mower, 100.0),
        ];
        assert_eq!(top_region(&rows).map(|t| t.region), Some(Region::SouthAmerica));
    }

    #[test]
    fn product_share_sums_to_hundred() {
        let rows = vec![
            rec(2020, Region::China, Product::Mower, 1.0),
            rec(2020, Region::China, Product::Tractor, 2.0),
        ];
        let share = product_share(&rows);
        let sum: f64 = share.values().sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((share[&Product::Tractor] - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn product_share_is_zero_without_units() {
        let rows = vec![rec(2020, Region::China, Product::Mower, 0.0)];
        let share = product_share(&rows);
        assert_eq!(share.len(), 2);
        assert!(share.values().all(|v| *v == 0.0));
        assert!(product_share(&[]).values().all(|v| *v == 0.0));
    }

    #[test]
    fn snapshot_of_empty_selection() {
        let snap = MetricsSnapshot::compute(&[]);
        assert!(snap.is_empty());
        assert_eq!(snap.total_units, 0);
        assert_eq!(snap.tractor_share, None);
        assert_eq!(snap.top_region, None);
        assert!(snap.pivot.is_empty());
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let rows = vec![rec(2020, Region::SouthAmerica, Product::Tractor, 4.0)];
        let snap = MetricsSnapshot::compute(&rows);
        assert_eq!(snap.tractor_share, Some(100.0));
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["top_region"]["region"], "South America");
        assert_eq!(json["time_series"][0]["month"], "2020-06-01");
        assert_eq!(json["product_share"]["Tractor"], 100.0);
    }
}
