use std::path::{Path, PathBuf};

use super::{
    unescape, ATTRIBUTES_HEADER, COUNT_PREFIX, FILE_PREFIX, INDENT, NO_SAMPLE_LINE, PATH_PREFIX,
    REPORT_SUFFIX, SAMPLE_HEADER, SEPARATOR, SUMMARY_HEADER,
};
use crate::data::model::FileKind;
use crate::error::{Result, SurveyError};

/// One file entry recovered from a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub file_name: String,
    pub path: PathBuf,
    pub attributes: Vec<String>,
    /// `(attribute, value)` pairs as written, `None` for the no-sample marker.
    pub sample: Option<Vec<(String, String)>>,
}

/// List `*_attributes.txt` reports in `dir`, sorted.
pub fn find_reports(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reports = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && report_slug(&path).is_some() {
            reports.push(path);
        }
    }
    reports.sort();
    Ok(reports)
}

/// File-type stem of a report name: `csv` for `csv_attributes.txt`.
pub fn report_slug(path: &Path) -> Option<&str> {
    path.file_name()?
        .to_str()?
        .strip_suffix(REPORT_SUFFIX)
        .filter(|slug| !slug.is_empty())
}

/// Kind encoded in a report name, `None` for reports of other tools.
pub fn report_kind(path: &Path) -> Option<FileKind> {
    report_slug(path).and_then(FileKind::from_slug)
}

/// Read and parse one report from disk.
pub fn parse_report(path: &Path) -> Result<Vec<ReportEntry>> {
    let text = std::fs::read_to_string(path)?;
    parse_report_text(&text, path)
}

#[derive(Debug, PartialEq)]
enum Section {
    Header,
    Attributes,
    Sample,
    Closed,
}

#[derive(Default)]
struct PendingEntry {
    file_name: String,
    path: Option<PathBuf>,
    declared: Option<usize>,
    attributes: Vec<String>,
    sample: Option<Vec<(String, String)>>,
    sample_marker: bool,
}

/// Parse report text; `source` is only used in error messages.
///
/// The whole report is rejected on the first layout violation.
pub fn parse_report_text(text: &str, source: &Path) -> Result<Vec<ReportEntry>> {
    let malformed = |line: usize, message: String| SurveyError::MalformedReport {
        path: source.to_path_buf(),
        line,
        message,
    };

    let mut entries = Vec::new();
    let mut current: Option<PendingEntry> = None;
    let mut section = Section::Header;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if line == SUMMARY_HEADER {
            if current.is_some() {
                return Err(malformed(line_no, "entry not closed before summary".into()));
            }
            break;
        }

        if let Some(name) = line.strip_prefix(FILE_PREFIX) {
            if current.is_some() {
                return Err(malformed(line_no, "entry not closed before next file".into()));
            }
            current = Some(PendingEntry {
                file_name: unescape(name),
                ..PendingEntry::default()
            });
            section = Section::Header;
            continue;
        }

        let Some(entry) = current.as_mut() else {
            // Report header and rules between entries.
            continue;
        };

        if line == SEPARATOR {
            let pending = current.take().unwrap_or_default();
            entries.push(finish_entry(pending).map_err(|msg| malformed(line_no, msg))?);
            continue;
        }
        if line.is_empty() {
            continue;
        }

        match section {
            Section::Header => {
                if let Some(path) = line.strip_prefix(PATH_PREFIX) {
                    entry.path = Some(PathBuf::from(unescape(path)));
                } else if let Some(count) = line.strip_prefix(COUNT_PREFIX) {
                    let count = count.trim().parse::<usize>().map_err(|_| {
                        malformed(line_no, format!("invalid attribute count '{count}'"))
                    })?;
                    entry.declared = Some(count);
                } else if line == ATTRIBUTES_HEADER {
                    section = Section::Attributes;
                } else {
                    return Err(malformed(line_no, format!("unexpected line '{line}'")));
                }
            }
            Section::Attributes => {
                if line == SAMPLE_HEADER {
                    entry.sample = Some(Vec::new());
                    entry.sample_marker = true;
                    section = Section::Sample;
                } else if line == NO_SAMPLE_LINE {
                    entry.sample_marker = true;
                    section = Section::Closed;
                } else {
                    let name = parse_numbered(line, entry.attributes.len() + 1)
                        .ok_or_else(|| malformed(line_no, format!("bad attribute line '{line}'")))?;
                    entry.attributes.push(name);
                }
            }
            Section::Sample => {
                let sample = entry.sample.get_or_insert_with(Vec::new);
                let Some(attr) = entry.attributes.get(sample.len()) else {
                    return Err(malformed(line_no, "more sample values than attributes".into()));
                };
                let prefix = format!("{INDENT}{}: ", super::escape(attr));
                let value = line.strip_prefix(prefix.as_str()).ok_or_else(|| {
                    malformed(line_no, format!("expected sample value for '{attr}'"))
                })?;
                sample.push((attr.clone(), unescape(value)));
            }
            Section::Closed => {
                return Err(malformed(line_no, format!("unexpected line '{line}'")));
            }
        }
    }

    if current.is_some() {
        let last = text.lines().count();
        return Err(malformed(last, "report ends inside an entry".into()));
    }
    Ok(entries)
}

/// Parse `"  <n>. <name>"`, requiring `n == expected`.
fn parse_numbered(line: &str, expected: usize) -> Option<String> {
    let rest = line.strip_prefix(INDENT)?;
    let (number, name) = rest.split_once(". ")?;
    if number.parse::<usize>().ok()? != expected {
        return None;
    }
    Some(unescape(name))
}

fn finish_entry(pending: PendingEntry) -> std::result::Result<ReportEntry, String> {
    let path = pending
        .path
        .ok_or_else(|| format!("entry '{}' has no path", pending.file_name))?;
    let declared = pending
        .declared
        .ok_or_else(|| format!("entry '{}' has no attribute count", pending.file_name))?;
    if declared != pending.attributes.len() {
        return Err(format!(
            "entry '{}' declares {declared} attributes but lists {}",
            pending.file_name,
            pending.attributes.len()
        ));
    }
    if !pending.sample_marker {
        return Err(format!("entry '{}' has no sample section", pending.file_name));
    }
    if let Some(sample) = &pending.sample {
        if sample.len() != pending.attributes.len() {
            return Err(format!(
                "entry '{}' has {} sample values for {} attributes",
                pending.file_name,
                sample.len(),
                pending.attributes.len()
            ));
        }
    }
    Ok(ReportEntry {
        file_name: pending.file_name,
        path,
        attributes: pending.attributes,
        sample: pending.sample,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AttributeValue, Extraction, FileGroup, FileResult};
    use crate::report::writer::render_report;

    fn result(path: &str, attrs: &[&str], sample: Option<Vec<AttributeValue>>) -> FileResult {
        let attributes: Vec<String> = attrs.iter().map(|s| s.to_string()).collect();
        let sample = sample.map(|values| attributes.iter().cloned().zip(values).collect());
        FileResult::new(PathBuf::from(path), Extraction { attributes, sample })
    }

    #[test]
    fn recovers_what_the_writer_wrote() {
        let results = vec![
            result(
                "/data/a/people.csv",
                &["id", "full. name", "note: x", "multi\nline"],
                Some(vec![
                    AttributeValue::Integer(3),
                    AttributeValue::String("Carl".into()),
                    AttributeValue::String("a: b".into()),
                    AttributeValue::String("one\ntwo".into()),
                ]),
            ),
            result("/data/b/empty.csv", &["id", ""], None),
            result("/data/c/nothing.csv", &[], None),
        ];
        let group = FileGroup {
            results: results.clone(),
            found: 3,
            ..FileGroup::default()
        };
        let text = render_report(FileKind::Csv, &group, "now");

        let entries = parse_report_text(&text, Path::new("csv_attributes.txt")).unwrap();
        assert_eq!(entries.len(), results.len());
        for (entry, result) in entries.iter().zip(&results) {
            assert_eq!(entry.file_name, result.file_name);
            assert_eq!(entry.path, result.path);
            assert_eq!(entry.attributes, result.attributes);
            assert_eq!(entry.sample.is_some(), result.sample.is_some());
        }
        assert_eq!(
            entries[0].sample.as_ref().unwrap()[3],
            ("multi\nline".to_string(), "one\ntwo".to_string())
        );
        assert_eq!(
            entries[0].sample.as_ref().unwrap()[2],
            ("note: x".to_string(), "a: b".to_string())
        );
    }

    #[test]
    fn count_mismatch_is_malformed() {
        let text = "\
File: a.csv
Path: /a.csv
Number of Attributes: 3

Attributes:
  1. x
  2. y

Sample Data: none (no record with all attributes populated)
--------------------------------------------------------------------------------
";
        let err = parse_report_text(text, Path::new("r.txt")).unwrap_err();
        match err {
            SurveyError::MalformedReport { line, message, .. } => {
                assert_eq!(line, 10);
                assert!(message.contains("declares 3"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unterminated_entry_is_malformed() {
        let text = "File: a.csv\nPath: /a.csv\nNumber of Attributes: 1\n\nAttributes:\n  1. x\n";
        assert!(matches!(
            parse_report_text(text, Path::new("r.txt")),
            Err(SurveyError::MalformedReport { .. })
        ));
    }

    #[test]
    fn misnumbered_attribute_is_malformed() {
        let text = "File: a.csv\nPath: /a.csv\nNumber of Attributes: 2\n\nAttributes:\n  1. x\n  3. y\n";
        let err = parse_report_text(text, Path::new("r.txt")).unwrap_err();
        assert!(matches!(err, SurveyError::MalformedReport { line: 7, .. }));
    }

    #[test]
    fn finds_reports_by_suffix() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["csv_attributes.txt", "shapefile_attributes.txt", "geojson_attributes.txt", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let reports = find_reports(dir.path()).unwrap();
        let slugs: Vec<&str> = reports.iter().filter_map(|p| report_slug(p)).collect();
        assert_eq!(slugs, vec!["csv", "geojson", "shapefile"]);
        let kinds: Vec<Option<FileKind>> = reports.iter().map(|p| report_kind(p)).collect();
        assert_eq!(kinds, vec![Some(FileKind::Csv), None, Some(FileKind::Shapefile)]);
    }
}
