use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

use super::model::{CellValue, Product, RawSheet, SalesDataset};
use super::sheet::{excel_serial_to_date, try_normalize};

// ---------------------------------------------------------------------------
// Source description
// ---------------------------------------------------------------------------

/// Where the workbook comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Workbook content handed over directly (e.g. an upload).
    Uploaded { name: String, bytes: Vec<u8> },
    /// Workbook on disk.
    Path(PathBuf),
}

impl Source {
    /// Short description for logs and status messages.
    pub fn describe(&self) -> String {
        match self {
            Source::Uploaded { name, bytes } => format!("upload '{name}' ({} bytes)", bytes.len()),
            Source::Path(path) => path.display().to_string(),
        }
    }
}

/// Pick the upload if there is one, else the default workbook if it exists.
pub fn resolve_source(uploaded: Option<(String, Vec<u8>)>, default_path: &Path) -> Result<Source> {
    if let Some((name, bytes)) = uploaded {
        return Ok(Source::Uploaded { name, bytes });
    }
    if default_path.is_file() {
        return Ok(Source::Path(default_path.to_path_buf()));
    }
    Err(DashboardError::source_unavailable(format!(
        "no upload given and default workbook {} not found",
        default_path.display()
    )))
}

/// Names of the two required sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub mower: String,
    pub tractor: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        SheetNames {
            mower: "Mower Unit Sales".to_string(),
            tractor: "Tractor Unit Sales".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the unified dataset from a source using the standard sheet names.
pub fn load(source: &Source) -> Result<SalesDataset> {
    load_with(source, &SheetNames::default())
}

/// Load the unified dataset from a source.
///
/// Files are read into memory first so both origins share one reader and
/// identical bytes always give identical datasets.
pub fn load_with(source: &Source, sheets: &SheetNames) -> Result<SalesDataset> {
    let dataset = match source {
        Source::Uploaded { bytes, .. } => load_bytes(bytes, sheets)?,
        Source::Path(path) => {
            let bytes = std::fs::read(path).map_err(|e| {
                DashboardError::source_unavailable(format!("reading {}: {e}", path.display()))
            })?;
            load_bytes(&bytes, sheets)?
        }
    };

    log::info!(
        "Loaded {} records ({} years, {} regions) from {}",
        dataset.len(),
        dataset.years.len(),
        dataset.regions.len(),
        source.describe()
    );
    Ok(dataset)
}

/// Parse workbook bytes (xlsx, xls, xlsb or ods) into the unified dataset.
pub fn load_bytes(bytes: &[u8], sheets: &SheetNames) -> Result<SalesDataset> {
    let (mower, tractor) = read_sheets(bytes, sheets)?;
    build(&mower, &tractor)
}

/// Run both product sheets through normalization and merge them.
///
/// Mower rows come first; the merged records are then stably sorted by month.
/// A badly shaped sheet is skipped with a warning, but if neither sheet
/// normalizes the source is reported as unavailable.
pub fn build(mower: &RawSheet, tractor: &RawSheet) -> Result<SalesDataset> {
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (raw, product) in [(mower, Product::Mower), (tractor, Product::Tractor)] {
        match try_normalize(raw, product) {
            Ok(recs) => records.extend(recs),
            Err(e) => {
                log::warn!("{product} sheet skipped: {e}");
                skipped.push(format!("{product}: {e}"));
            }
        }
    }
    if skipped.len() == Product::ALL.len() {
        return Err(DashboardError::source_unavailable(format!(
            "no usable sales sheet ({})",
            skipped.join("; ")
        )));
    }
    Ok(SalesDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Workbook reading
// ---------------------------------------------------------------------------

/// Extract the mower and tractor sheets as raw grids.
pub fn read_sheets(bytes: &[u8], sheets: &SheetNames) -> Result<(RawSheet, RawSheet)> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DashboardError::source_unavailable(format!("unreadable workbook: {e}")))?;

    let available = workbook.sheet_names();
    for required in [&sheets.mower, &sheets.tractor] {
        if !available.iter().any(|name| name == required) {
            return Err(DashboardError::source_unavailable(format!(
                "workbook has no sheet named '{required}' (found {available:?})"
            )));
        }
    }

    let mut grid = |name: &str| -> Result<RawSheet> {
        let range = workbook.worksheet_range(name).map_err(|e| {
            DashboardError::source_unavailable(format!("reading sheet '{name}': {e}"))
        })?;
        Ok(range_to_sheet(&range))
    };

    let mower = grid(&sheets.mower)?;
    let tractor = grid(&sheets.tractor)?;
    Ok((mower, tractor))
}

/// Leading non-blank rows consumed as column labels, like a dataframe reader.
const LABEL_ROWS: usize = 1;

/// Convert a calamine range into a grid the way a dataframe reader sees it:
/// fully blank rows are skipped and the first remaining row is taken as
/// column labels, so grid row 0 is the worksheet row after it. Columns stay
/// anchored at A.
fn range_to_sheet(range: &Range<Data>) -> RawSheet {
    let col_offset = range.start().map_or(0, |(_, c)| c as usize);

    let rows = range
        .rows()
        .map(|row| {
            let mut cells = vec![CellValue::Missing; col_offset];
            cells.extend(row.iter().map(data_to_cell));
            cells
        })
        .filter(|cells| cells.iter().any(|c| !c.is_missing()))
        .skip(LABEL_ROWS)
        .collect();
    RawSheet::new(rows)
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string().to_uppercase()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(CellValue::Date)
            .unwrap_or(CellValue::Missing),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
    }
}
