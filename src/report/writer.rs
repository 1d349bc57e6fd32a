use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{
    escape, ATTRIBUTES_HEADER, COUNT_PREFIX, FILE_PREFIX, INDENT, NO_SAMPLE_LINE, PATH_PREFIX,
    RULE, SAMPLE_HEADER, SEPARATOR, SUMMARY_HEADER,
};
use crate::data::model::{FileGroup, FileKind, FileResult};
use crate::error::Result;
use crate::overlap::rank_attributes;

/// Sample values longer than this are shortened.
const MAX_VALUE_CHARS: usize = 100;

/// Attributes listed in the report summary.
const SUMMARY_TOP_N: usize = 10;

/// Write one report per kind that has at least one result, replacing any
/// report left by a previous run. Returns the written paths.
pub fn write_reports(groups: &BTreeMap<FileKind, FileGroup>, out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;
    let generated_on = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let mut written = Vec::new();
    for (kind, group) in groups {
        if group.results.is_empty() {
            log::info!("no {} results, skipping report", kind.label());
            continue;
        }
        let path = out_dir.join(kind.report_file_name());
        let mut out = BufWriter::new(File::create(&path)?);
        write_report(&mut out, *kind, group, &generated_on)?;
        out.flush()?;
        log::info!("wrote {} entries to {}", group.results.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

/// Write the full text of one report.
pub fn write_report<W: Write>(
    out: &mut W,
    kind: FileKind,
    group: &FileGroup,
    generated_on: &str,
) -> io::Result<()> {
    writeln!(out, "=== {} Attribute Extraction ===", kind.label())?;
    writeln!(out, "Total files found: {}", group.found)?;
    writeln!(out, "Generated on: {generated_on}")?;
    writeln!(out, "{RULE}\n")?;

    for result in &group.results {
        write_entry(out, result)?;
    }

    write_summary(out, group)
}

fn write_entry<W: Write>(out: &mut W, result: &FileResult) -> io::Result<()> {
    writeln!(out, "{FILE_PREFIX}{}", escape(&result.file_name))?;
    writeln!(out, "{PATH_PREFIX}{}", escape(&result.path.display().to_string()))?;
    writeln!(out, "{COUNT_PREFIX}{}\n", result.attribute_count())?;

    writeln!(out, "{ATTRIBUTES_HEADER}")?;
    for (i, attr) in result.attributes.iter().enumerate() {
        writeln!(out, "{INDENT}{}. {}", i + 1, escape(attr))?;
    }
    writeln!(out)?;

    match &result.sample {
        Some(sample) => {
            writeln!(out, "{SAMPLE_HEADER}")?;
            for (attr, value) in sample {
                let value = truncate(&value.to_string());
                writeln!(out, "{INDENT}{}: {}", escape(attr), escape(&value))?;
            }
        }
        None => writeln!(out, "{NO_SAMPLE_LINE}")?,
    }
    writeln!(out, "{SEPARATOR}\n")
}

fn write_summary<W: Write>(out: &mut W, group: &FileGroup) -> io::Result<()> {
    let ranked = rank_attributes(group.results.iter().map(|r| r.attributes.as_slice()));

    writeln!(out, "\n{RULE}")?;
    writeln!(out, "{SUMMARY_HEADER}")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Total files found: {}", group.found)?;
    writeln!(out, "Successfully processed: {}", group.processed())?;
    writeln!(out, "Skipped (duplicates): {}", group.duplicates)?;
    writeln!(out, "Failed (unreadable): {}", group.failures)?;
    writeln!(out, "Without complete sample: {}", group.without_sample())?;
    writeln!(out, "Total unique attributes: {}", ranked.len())?;
    writeln!(out, "Top {SUMMARY_TOP_N} attributes:")?;
    for (attr, count) in ranked.iter().take(SUMMARY_TOP_N) {
        writeln!(out, "{INDENT}{}: {count}", escape(attr))?;
    }
    Ok(())
}

/// Shorten to 97 characters plus an ellipsis when over the limit.
fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_VALUE_CHARS {
        return value.to_string();
    }
    let mut short: String = value.chars().take(MAX_VALUE_CHARS - 3).collect();
    short.push_str("...");
    short
}

/// Report text as a string, for tests that parse what the writer produced.
#[cfg(test)]
pub(crate) fn render_report(kind: FileKind, group: &FileGroup, generated_on: &str) -> String {
    let mut buf = Vec::new();
    write_report(&mut buf, kind, group, generated_on).unwrap();
    String::from_utf8(buf).unwrap()
}
