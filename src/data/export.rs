use serde::Serialize;

use crate::error::{DashboardError, Result};

use super::model::CleanRecord;

/// Default file name offered for the filtered export.
pub const EXPORT_FILE_NAME: &str = "filtered_sales.csv";

/// One CSV line. Field order is the column order.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Month")]
    month: String,
    #[serde(rename = "Region")]
    region: &'a str,
    #[serde(rename = "Units")]
    units: f64,
    #[serde(rename = "Product")]
    product: &'a str,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "MonthName")]
    month_name: &'a str,
}

/// Serialize records as UTF-8 CSV with a header row and no index column.
pub fn export_csv(rows: &[CleanRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record(["Month", "Region", "Units", "Product", "Year", "MonthName"])?;
    }
    for rec in rows {
        writer.serialize(ExportRow {
            month: rec.month.format("%Y-%m-%d").to_string(),
            region: rec.region.as_str(),
            units: rec.units,
            product: rec.product.as_str(),
            year: rec.year,
            month_name: rec.month_name,
        })?;
    }
    writer
        .into_inner()
        .map_err(|e| DashboardError::Io(e.into_error()))
}
