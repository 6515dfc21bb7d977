use chrono::NaiveDate;

use super::model::{CleanRecord, Product, Region};

// ---------------------------------------------------------------------------
// Wide table: one row per month, one column per region
// ---------------------------------------------------------------------------

/// A single region column of a [`WideTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegionColumn {
    pub region: Region,
    /// One entry per table row; `None` where the cell was not a valid quantity.
    pub units: Vec<Option<f64>>,
}

/// Cleaned wide form of one sheet, as produced by the sheet normalizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    /// One entry per table row; `None` where the month cell was unparsable.
    pub months: Vec<Option<NaiveDate>>,
    /// Region columns in sheet order.
    pub columns: Vec<RegionColumn>,
}

impl WideTable {
    pub fn n_rows(&self) -> usize {
        self.months.len()
    }
}

// ---------------------------------------------------------------------------
// Melt
// ---------------------------------------------------------------------------

/// Melt a wide table into tidy records tagged with `product`.
///
/// Records are emitted row by row, and within a row in column order. A cell
/// produces a record only if both its month and its units are present; this
/// is the only place rows are dropped for data quality.
pub fn reshape(wide: &WideTable, product: Product) -> Vec<CleanRecord> {
    let mut records = Vec::with_capacity(wide.n_rows() * wide.columns.len());

    for (row, month) in wide.months.iter().enumerate() {
        let Some(month) = month else {
            continue;
        };
        for column in &wide.columns {
            if let Some(units) = column.units.get(row).copied().flatten() {
                records.push(CleanRecord::new(*month, column.region, product, units));
            }
        }
    }

    records
}
