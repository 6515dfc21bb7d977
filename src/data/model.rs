use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a raw worksheet
// ---------------------------------------------------------------------------

/// A dynamically-typed spreadsheet cell, resolved explicitly during
/// normalization instead of being coerced implicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Missing,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Missing => Ok(()),
        }
    }
}

impl CellValue {
    /// Text cell, with blank strings collapsed to `Missing`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            CellValue::Missing
        } else {
            CellValue::Text(s)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

// ---------------------------------------------------------------------------
// RawSheet – an untyped grid as extracted from a workbook
// ---------------------------------------------------------------------------

/// Rows × columns of cells, anchored at A1. Rows may be ragged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<CellValue>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        RawSheet { rows }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn n_cols(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at (row, col); out-of-range cells read as `Missing`.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static MISSING: CellValue = CellValue::Missing;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&MISSING)
    }
}

// ---------------------------------------------------------------------------
// Region / Product vocabularies
// ---------------------------------------------------------------------------

/// Canonical sales regions. Declared alphabetically so the derived `Ord`
/// matches name order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    China,
    Europe,
    Pacific,
    #[serde(rename = "South America")]
    SouthAmerica,
    World,
}

/// Column header synonyms → canonical region.
const REGION_ALIASES: &[(&str, Region)] = &[
    ("SA", Region::SouthAmerica),
    ("Eur", Region::Europe),
    ("Europe", Region::Europe),
    ("Pacific", Region::Pacific),
    ("China", Region::China),
    ("World", Region::World),
];

impl Region {
    pub const ALL: [Region; 5] = [
        Region::China,
        Region::Europe,
        Region::Pacific,
        Region::SouthAmerica,
        Region::World,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Region::China => "China",
            Region::Europe => "Europe",
            Region::Pacific => "Pacific",
            Region::SouthAmerica => "South America",
            Region::World => "World",
        }
    }

    /// Resolve a raw column header through the alias table, falling back to
    /// the canonical names. Unknown headers yield `None`.
    pub fn from_header(header: &str) -> Option<Region> {
        let header = header.trim();
        REGION_ALIASES
            .iter()
            .find(|(alias, _)| *alias == header)
            .map(|(_, region)| *region)
            .or_else(|| Region::ALL.into_iter().find(|r| r.as_str() == header))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Product {
    Mower,
    Tractor,
}

impl Product {
    pub const ALL: [Product; 2] = [Product::Mower, Product::Tractor];

    pub fn as_str(self) -> &'static str {
        match self {
            Product::Mower => "Mower",
            Product::Tractor => "Tractor",
        }
    }

    pub fn from_label(label: &str) -> Option<Product> {
        Product::ALL.into_iter().find(|p| p.as_str() == label.trim())
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CleanRecord – one (month, region, product) observation
// ---------------------------------------------------------------------------

/// Tidy form record. `year` and `month_name` are derived from `month`.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    /// First day of the calendar month.
    pub month: NaiveDate,
    pub region: Region,
    pub product: Product,
    pub units: f64,
    pub year: i32,
    pub month_name: &'static str,
}

impl CleanRecord {
    pub fn new(month: NaiveDate, region: Region, product: Product, units: f64) -> Self {
        let month = month_start(month);
        CleanRecord {
            month,
            region,
            product,
            units,
            year: month.year(),
            month_name: short_month_name(month.month()),
        }
    }

    /// Calendar month number, 1–12.
    pub fn month_number(&self) -> u32 {
        self.month.month()
    }
}

/// Normalize a date to the first day of its month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Short English month label ("Jan" … "Dec").
pub fn short_month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    month
        .checked_sub(1)
        .and_then(|i| NAMES.get(i as usize))
        .copied()
        .unwrap_or("")
}

// ---------------------------------------------------------------------------
// SalesDataset – the unified, sorted dataset
// ---------------------------------------------------------------------------

/// The unified dataset with pre-computed option lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesDataset {
    /// All records, sorted by month ascending.
    pub records: Vec<CleanRecord>,
    pub products: BTreeSet<Product>,
    pub regions: BTreeSet<Region>,
    pub years: BTreeSet<i32>,
}

impl SalesDataset {
    /// Sort the records (stable, by month) and index their distinct values.
    pub fn from_records(mut records: Vec<CleanRecord>) -> Self {
        records.sort_by_key(|r| r.month);

        let mut products = BTreeSet::new();
        let mut regions = BTreeSet::new();
        let mut years = BTreeSet::new();
        for rec in &records {
            products.insert(rec.product);
            regions.insert(rec.region);
            years.insert(rec.year);
        }
        SalesDataset {
            records,
            products,
            regions,
            years,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
