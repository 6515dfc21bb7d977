/// Data layer: core types, normalization, loading, filtering and export.
///
/// Architecture:
/// ```text
///  .xlsx (upload or default path)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  workbook → two RawSheets
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  sheet    │  header row, aliases, coercion → WideTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  reshape  │  melt → CleanRecords
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SalesDataset │  both products, sorted by month (cached)
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  product / region / year / World predicates → copy
///   └──────────┘
///        │
///        ▼
///     metrics, export
/// ```

pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod reshape;
pub mod sample;
pub mod sheet;
