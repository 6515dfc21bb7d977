//! Error types for the sales pipeline.
//!
//! - [`DashboardError`] - fatal load/export failures, reported once at the top
//! - [`SheetShapeError`] - a single sheet is unusable; its product is skipped
//!
//! Cell-level problems (bad dates, non-numeric units) are not errors at all:
//! they become nulls and the affected records are dropped.

use thiserror::Error;

/// Errors that abort dataset construction or export.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Neither an upload nor the default workbook could be read as the two
    /// required sheets.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export error: {0}")]
    Export(#[from] csv::Error),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),
}

impl DashboardError {
    pub fn source_unavailable(reason: impl Into<String>) -> Self {
        DashboardError::SourceUnavailable(reason.into())
    }
}

/// A sheet that lacks the minimum header + data shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetShapeError {
    #[error("sheet has {rows} row(s), need a title row, a header row and at least one data row")]
    TooFewRows { rows: usize },

    #[error("sheet has no recognized region columns besides the month column")]
    NoRegionColumns,
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
