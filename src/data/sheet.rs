use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

use crate::error::SheetShapeError;

use super::model::{month_start, CellValue, CleanRecord, Product, RawSheet, Region};
use super::reshape::{reshape, RegionColumn, WideTable};

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

/// Row holding the real column headers; row 0 is a title row.
pub const HEADER_ROW: usize = 1;

/// First data row.
pub const FIRST_DATA_ROW: usize = HEADER_ROW + 1;

/// Name of the timestamp column.
pub const MONTH_COLUMN: &str = "Month";

/// Excel serial for 9999-12-31 plus one.
const MAX_EXCEL_SERIAL: f64 = 2_958_466.0;

/// Years accepted from text months; chrono's `%Y` also takes signed years.
const TEXT_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Normalize one product sheet into tidy records.
///
/// A badly shaped sheet yields no records (with a warning) so the other
/// product can still be shown.
pub fn normalize(raw: &RawSheet, product: Product) -> Vec<CleanRecord> {
    try_normalize(raw, product).unwrap_or_else(|e| {
        log::warn!("{product} sheet skipped: {e}");
        Vec::new()
    })
}

/// Like [`normalize`], but reports a badly shaped sheet to the caller.
pub fn try_normalize(raw: &RawSheet, product: Product) -> Result<Vec<CleanRecord>, SheetShapeError> {
    normalize_wide(raw).map(|wide| reshape(&wide, product))
}

/// Clean a raw sheet into its wide form.
///
/// Steps:
/// 1. drop columns that are entirely empty;
/// 2. read headers from [`HEADER_ROW`], data from [`FIRST_DATA_ROW`];
/// 3. the column literally named `Month` holds timestamps, else the first one;
/// 4. other headers go through the region alias table, unknown ones are dropped;
/// 5. months and units are coerced, unparsable cells become `None`.
pub fn normalize_wide(raw: &RawSheet) -> Result<WideTable, SheetShapeError> {
    if raw.n_rows() <= FIRST_DATA_ROW {
        return Err(SheetShapeError::TooFewRows { rows: raw.n_rows() });
    }

    let kept: Vec<usize> = (0..raw.n_cols())
        .filter(|&col| raw.rows.iter().any(|row| row.get(col).is_some_and(|c| !c.is_missing())))
        .collect();

    let headers: Vec<String> = kept
        .iter()
        .map(|&col| raw.cell(HEADER_ROW, col).to_string().trim().to_string())
        .collect();

    let month_pos = headers
        .iter()
        .position(|h| h == MONTH_COLUMN)
        .unwrap_or(0);
    let Some(&month_col) = kept.get(month_pos) else {
        return Err(SheetShapeError::NoRegionColumns);
    };

    let region_cols: Vec<(usize, Region)> = kept
        .iter()
        .zip(&headers)
        .enumerate()
        .filter(|(pos, _)| *pos != month_pos)
        .filter_map(|(_, (&col, header))| Region::from_header(header).map(|r| (col, r)))
        .collect();

    if region_cols.is_empty() {
        return Err(SheetShapeError::NoRegionColumns);
    }

    let data_rows = FIRST_DATA_ROW..raw.n_rows();

    let months = data_rows
        .clone()
        .map(|row| coerce_month(raw.cell(row, month_col)))
        .collect();

    let columns = region_cols
        .into_iter()
        .map(|(col, region)| RegionColumn {
            region,
            units: data_rows
                .clone()
                .map(|row| coerce_units(raw.cell(row, col)))
                .collect(),
        })
        .collect();

    Ok(WideTable { months, columns })
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Interpret a cell as a calendar month (first day of month).
pub fn coerce_month(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(month_start(*d)),
        CellValue::Number(n) => excel_serial_to_date(*n).map(month_start),
        CellValue::Text(s) => parse_date_text(s).map(month_start),
        CellValue::Missing => None,
    }
}

/// Interpret a cell as a unit count. Negative or non-finite values are null.
pub fn coerce_units(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        CellValue::Date(_) | CellValue::Missing => return None,
    };
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Convert an Excel serial day number (1900 date system) to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let days = serial.floor() as u64;
    // Serials below 60 precede Excel's phantom 1900-02-29.
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_days(Days::new(days))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
    // Month-only layouts, completed with a day before parsing.
    // `Jun-19` must hit `%y` before any `%Y` layout.
    const MONTH_FORMATS: &[(&str, &str)] = &[
        ("{}-01", "%Y-%m-%d"),
        ("01-{}", "%d-%b-%y"),
        ("01-{}", "%d-%b-%Y"),
        ("01 {}", "%d %b %Y"),
        ("01 {}", "%d %B %Y"),
    ];

    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let plausible = |d: NaiveDate| TEXT_YEARS.contains(&d.year());

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDateTime::parse_from_str(s, fmt)
                .ok()
                .map(|dt| dt.date())
                .filter(|d| plausible(*d))
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok().filter(|d| plausible(*d)))
        })
        .or_else(|| {
            MONTH_FORMATS.iter().find_map(|(template, fmt)| {
                let completed = template.replace("{}", s);
                NaiveDate::parse_from_str(&completed, fmt)
                    .ok()
                    .filter(|d| plausible(*d))
            })
        })
}
