//! Plain-text attribute reports: one file per file kind, written by the
//! extractor and read back by the overlap analyzer.
//!
//! Layout of one entry:
//! ```text
//! File: parcels.csv
//! Path: /data/city/parcels.csv
//! Number of Attributes: 3
//!
//! Attributes:
//!   1. id
//!   2. owner
//!   3. area
//!
//! Sample Data:
//!   id: 17
//!   owner: Lee
//!   area: 402.5
//! --------------------------------------------------------------------------------
//! ```
//! Names, paths and values are escaped so every field stays on one line.

pub mod parser;
pub mod writer;

pub use parser::{
    find_reports, parse_report, parse_report_text, report_kind, report_slug, ReportEntry,
};
pub use writer::{write_report, write_reports};

pub(crate) const RULE: &str =
    "================================================================================";
pub(crate) const SEPARATOR: &str =
    "--------------------------------------------------------------------------------";

pub(crate) const FILE_PREFIX: &str = "File: ";
pub(crate) const PATH_PREFIX: &str = "Path: ";
pub(crate) const COUNT_PREFIX: &str = "Number of Attributes: ";
pub(crate) const ATTRIBUTES_HEADER: &str = "Attributes:";
pub(crate) const SAMPLE_HEADER: &str = "Sample Data:";
pub(crate) const NO_SAMPLE_LINE: &str =
    "Sample Data: none (no record with all attributes populated)";
pub(crate) const SUMMARY_HEADER: &str = "SUMMARY";
pub(crate) const INDENT: &str = "  ";

/// Suffix shared by every report file name.
pub const REPORT_SUFFIX: &str = "_attributes.txt";

/// Escape backslashes and line breaks.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`escape`]. Unknown escapes are kept verbatim.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
