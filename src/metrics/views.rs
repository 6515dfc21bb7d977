use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::model::{short_month_name, CleanRecord, Product, Region};

// ---------------------------------------------------------------------------
// Grouped series
// ---------------------------------------------------------------------------

/// Units summed per (month, product, region).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub month: NaiveDate,
    pub product: Product,
    pub region: Region,
    pub units: f64,
}

/// Units summed per (month, product).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPoint {
    pub month: NaiveDate,
    pub product: Product,
    pub units: f64,
}

/// Mean units per (year, calendar month, product).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalityCell {
    pub year: i32,
    /// Calendar month, 1–12.
    pub month: u32,
    pub product: Product,
    pub mean_units: f64,
}

/// Output is ordered by key.
pub fn time_series(rows: &[CleanRecord]) -> Vec<TimeSeriesPoint> {
    let mut sums: BTreeMap<(NaiveDate, Product, Region), f64> = BTreeMap::new();
    for rec in rows {
        *sums.entry((rec.month, rec.product, rec.region)).or_default() += rec.units;
    }
    sums.into_iter()
        .map(|((month, product, region), units)| TimeSeriesPoint {
            month,
            product,
            region,
            units,
        })
        .collect()
}

pub fn product_comparison(rows: &[CleanRecord]) -> Vec<ProductPoint> {
    let mut sums: BTreeMap<(NaiveDate, Product), f64> = BTreeMap::new();
    for rec in rows {
        *sums.entry((rec.month, rec.product)).or_default() += rec.units;
    }
    sums.into_iter()
        .map(|((month, product), units)| ProductPoint {
            month,
            product,
            units,
        })
        .collect()
}

pub fn seasonality(rows: &[CleanRecord]) -> Vec<SeasonalityCell> {
    let mut acc: BTreeMap<(i32, u32, Product), (f64, usize)> = BTreeMap::new();
    for rec in rows {
        let slot = acc
            .entry((rec.year, rec.month_number(), rec.product))
            .or_insert((0.0, 0));
        slot.0 += rec.units;
        slot.1 += 1;
    }
    acc.into_iter()
        .map(|((year, month, product), (sum, count))| SeasonalityCell {
            year,
            month,
            product,
            mean_units: sum / count as f64,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pivot table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PivotRowKey {
    pub year: i32,
    /// Calendar month, 1–12. Orders rows chronologically.
    pub month: u32,
    pub month_name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PivotColumnKey {
    pub product: Product,
    pub region: Region,
}

/// Units cross-tabulated by (year, month) × (product, region).
///
/// Only combinations present in the input get a row or column; gaps inside
/// the grid are 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotTable {
    pub rows: Vec<PivotRowKey>,
    pub columns: Vec<PivotColumnKey>,
    /// `values[row][column]`.
    pub values: Vec<Vec<f64>>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up one cell. `None` if either key is not part of the table.
    pub fn value(&self, year: i32, month_name: &str, product: Product, region: Region) -> Option<f64> {
        let row = self
            .rows
            .iter()
            .position(|k| k.year == year && k.month_name == month_name)?;
        let col = self
            .columns
            .iter()
            .position(|k| k.product == product && k.region == region)?;
        self.values.get(row)?.get(col).copied()
    }

    /// Sum of one table row.
    pub fn row_total(&self, row: usize) -> f64 {
        self.values.get(row).map(|r| r.iter().sum()).unwrap_or(0.0)
    }
}

pub fn pivot(rows: &[CleanRecord]) -> PivotTable {
    let mut sums: BTreeMap<(PivotRowKey, PivotColumnKey), f64> = BTreeMap::new();
    let mut row_keys = BTreeSet::new();
    let mut col_keys = BTreeSet::new();

    for rec in rows {
        let row = PivotRowKey {
            year: rec.year,
            month: rec.month_number(),
            month_name: short_month_name(rec.month_number()),
        };
        let col = PivotColumnKey {
            product: rec.product,
            region: rec.region,
        };
        row_keys.insert(row);
        col_keys.insert(col);
        *sums.entry((row, col)).or_default() += rec.units;
    }

    let rows: Vec<PivotRowKey> = row_keys.into_iter().collect();
    let columns: Vec<PivotColumnKey> = col_keys.into_iter().collect();
    let values = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| sums.get(&(*r, *c)).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();

    PivotTable {
        rows,
        columns,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn rec(y: i32, m: u32, region: Region, product: Product, units: f64) -> CleanRecord {
        CleanRecord::new(date(y, m), region, product, units)
    }

    fn rows() -> Vec<CleanRecord> {
        vec![
            rec(2020, 1, Region::Europe, Product::Tractor, 5.0),
            rec(2020, 1, Region::China, Product::Mower, 2.0),
            rec(2020, 1, Region::China, Product::Mower, 3.0),
            rec(2020, 2, Region::China, Product::Tractor, 4.0),
            rec(2021, 1, Region::Europe, Product::Tractor, 7.0),
        ]
    }

    #[test]
    fn time_series_sums_duplicates_in_key_order() {
        let ts = time_series(&rows());
        assert_eq!(ts.len(), 4);
        assert_eq!(
            ts[0],
            TimeSeriesPoint {
                month: date(2020, 1),
                product: Product::Mower,
                region: Region::China,
                units: 5.0,
            }
        );
        assert_eq!(ts[1].product, Product::Tractor);
    }

    #[test]
    fn product_comparison_groups_by_month_and_product() {
        let comp = product_comparison(&rows());
        let got: Vec<_> = comp.iter().map(|p| (p.month, p.product, p.units)).collect();
        assert_eq!(
            got,
            vec![
                (date(2020, 1), Product::Mower, 5.0),
                (date(2020, 1), Product::Tractor, 5.0),
                (date(2020, 2), Product::Tractor, 4.0),
                (date(2021, 1), Product::Tractor, 7.0),
            ]
        );
    }

    #[test]
    fn seasonality_averages_records() {
        let sea = seasonality(&rows());
        let mower_jan = sea
            .iter()
            .find(|c| c.year == 2020 && c.month == 1 && c.product == Product::Mower)
            .unwrap();
        assert_eq!(mower_jan.mean_units, 2.5);
        assert_eq!(sea.len(), 4);
    }

    #[test]
    fn pivot_fills_missing_combinations_with_zero() {
        let piv = pivot(&rows());
        assert_eq!(piv.rows.len(), 3);
        assert_eq!(piv.columns.len(), 3);
        assert_eq!(piv.value(2020, "Jan", Product::Mower, Region::China), Some(5.0));
        assert_eq!(piv.value(2021, "Jan", Product::Mower, Region::China), Some(0.0));
        assert_eq!(piv.value(2021, "Jan", Product::Tractor, Region::Europe), Some(7.0));
        assert_eq!(piv.value(2019, "Jan", Product::Tractor, Region::Europe), None);
        assert_eq!(piv.row_total(0), 10.0);
    }

    #[test]
    fn pivot_rows_are_chronological() {
        let piv = pivot(&[
            rec(2020, 8, Region::Pacific, Product::Mower, 1.0),
            rec(2020, 4, Region::Pacific, Product::Mower, 1.0),
        ]);
        let names: Vec<_> = piv.rows.iter().map(|r| r.month_name).collect();
        assert_eq!(names, vec!["Apr", "Aug"]);
        let piv = pivot(&[
            rec(2020, 2, Region::Pacific, Product::Mower, 1.0),
            rec(2020, 1, Region::Pacific, Product::Mower, 1.0),
        ]);
        let names: Vec<_> = piv.rows.iter().map(|r| r.month_name).collect();
        assert_eq!(names, vec!["Jan", "Feb"]);
    }

    #[test]
    fn empty_input_gives_empty_views() {
        assert!(time_series(&[]).is_empty());
        assert!(product_comparison(&[]).is_empty());
        assert!(seasonality(&[]).is_empty());
        assert!(pivot(&[]).is_empty());
    }
}
