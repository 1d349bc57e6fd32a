/// Data layer: core types, format handlers, and the file-name filter.
///
/// Architecture:
/// ```text
///  .shp (+ .dbf) / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │ handler  │  FileHandler::extract → Extraction
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ FileResult │  attributes + first complete record
///   └────────────┘
/// ```
///
/// `filter` decides which file names enter the pipeline at all.
pub mod filter;
pub mod handler;
pub mod model;
