//! Survey attribute (column) names across a tree of shapefiles, CSV and
//! Parquet files, pick one fully populated sample record per file, and
//! analyze how attribute names overlap between files.
//!
//! ```text
//!  root ─► scan ─► pipeline (dedup + handlers) ─► report::writer ─► *_attributes.txt
//!                                                                        │
//!                              visualizations/ ◄─ overlap ◄─ report::parser
//! ```

pub mod color;
pub mod data;
pub mod error;
pub mod overlap;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod scan;

pub use error::SurveyError;

/// Initialise logging for the binaries: `warn` unless `RUST_LOG` says
/// otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}
