//! Attribute overlap across the files of one report.

pub mod chart;
pub mod summary;

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::report::{find_reports, parse_report, report_slug, ReportEntry};

/// Files shown in the overlap diagram.
pub const MAX_DIAGRAM_FILES: usize = 20;
/// Intersection columns shown in the overlap diagram.
pub const MAX_DIAGRAM_GROUPS: usize = 15;
/// Bars in the frequency chart.
pub const FREQUENCY_TOP_N: usize = 30;

/// File name → distinct attribute names.
pub type FileAttributes = BTreeMap<String, BTreeSet<String>>;

/// Collapse parsed entries into per-file attribute sets.
pub fn file_attributes(entries: &[ReportEntry]) -> FileAttributes {
    entries
        .iter()
        .map(|e| (e.file_name.clone(), e.attributes.iter().cloned().collect()))
        .collect()
}

/// Document frequency of every attribute, ranked by count (descending) and
/// then name. An attribute repeated inside one file counts once.
pub fn rank_attributes<'a, I>(attribute_lists: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for list in attribute_lists {
        let distinct: BTreeSet<&str> = list.iter().map(String::as_str).collect();
        for attr in distinct {
            *counts.entry(attr).or_default() += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(attr, count)| (attr.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeCount {
    pub attribute: String,
    pub files: usize,
}

/// Attributes shared by exactly this set of files and no other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Intersection {
    pub files: Vec<String>,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairOverlap {
    pub left: String,
    pub right: String,
    pub shared: usize,
}

/// Everything the summary, charts and JSON document are built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapAnalysis {
    pub total_files: usize,
    pub total_unique_attributes: usize,
    /// Ranked document frequencies.
    pub attribute_counts: Vec<AttributeCount>,
    /// Attributes present in every file.
    pub common_attributes: Vec<String>,
    /// Attribute → the only file containing it.
    pub unique_attributes: BTreeMap<String, String>,
    /// Exact intersections, largest first.
    pub intersections: Vec<Intersection>,
    pub pairwise: Vec<PairOverlap>,
}

impl OverlapAnalysis {
    pub fn top(&self, n: usize) -> &[AttributeCount] {
        &self.attribute_counts[..n.min(self.attribute_counts.len())]
    }

    pub fn percentage(&self, count: usize) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        count as f64 / self.total_files as f64 * 100.0
    }
}

pub fn analyze(files: &FileAttributes) -> OverlapAnalysis {
    let lists: Vec<Vec<String>> = files
        .values()
        .map(|set| set.iter().cloned().collect())
        .collect();
    let attribute_counts: Vec<AttributeCount> = rank_attributes(lists.iter().map(Vec::as_slice))
        .into_iter()
        .map(|(attribute, files)| AttributeCount { attribute, files })
        .collect();

    let total_files = files.len();
    let mut common_attributes: Vec<String> = attribute_counts
        .iter()
        .filter(|c| total_files > 0 && c.files == total_files)
        .map(|c| c.attribute.clone())
        .collect();
    common_attributes.sort();

    let singletons: BTreeSet<&str> = attribute_counts
        .iter()
        .filter(|c| c.files == 1)
        .map(|c| c.attribute.as_str())
        .collect();
    let mut unique_attributes = BTreeMap::new();
    for (file, attrs) in files {
        for attr in attrs.iter().filter(|a| singletons.contains(a.as_str())) {
            unique_attributes.insert(attr.clone(), file.clone());
        }
    }

    let mut pairwise = Vec::new();
    let names: Vec<&String> = files.keys().collect();
    for (i, left) in names.iter().enumerate() {
        for right in &names[i + 1..] {
            let shared = files[*left].intersection(&files[*right]).count();
            pairwise.push(PairOverlap {
                left: (*left).clone(),
                right: (*right).clone(),
                shared,
            });
        }
    }

    OverlapAnalysis {
        total_files,
        total_unique_attributes: attribute_counts.len(),
        attribute_counts,
        common_attributes,
        unique_attributes,
        intersections: intersections(files),
        pairwise,
    }
}

/// Group attributes by the exact set of files containing them.
pub fn intersections(files: &FileAttributes) -> Vec<Intersection> {
    let mut owners: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (file, attrs) in files {
        for attr in attrs {
            owners.entry(attr).or_default().push(file.clone());
        }
    }

    let mut groups: BTreeMap<Vec<String>, Vec<String>> = BTreeMap::new();
    for (attr, file_set) in owners {
        groups.entry(file_set).or_default().push(attr.to_string());
    }

    let mut result: Vec<Intersection> = groups
        .into_iter()
        .map(|(files, attributes)| Intersection { files, attributes })
        .collect();
    result.sort_by(|a, b| {
        b.attributes
            .len()
            .cmp(&a.attributes.len())
            .then_with(|| b.files.len().cmp(&a.files.len()))
            .then_with(|| a.files.cmp(&b.files))
    });
    result
}

/// The `limit` files with the most attributes (ties by name).
pub fn largest_files(files: &FileAttributes, limit: usize) -> FileAttributes {
    let mut ranked: Vec<(&String, &BTreeSet<String>)> = files.iter().collect();
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(name, attrs)| (name.clone(), attrs.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Report directory → visualizations
// ---------------------------------------------------------------------------

/// Outputs produced for one report.
#[derive(Debug)]
pub struct ReportAnalysis {
    pub slug: String,
    pub analysis: OverlapAnalysis,
    pub outputs: Vec<PathBuf>,
}

/// Analyze every report in `report_dir`, writing into
/// `report_dir/visualizations`. Malformed or empty reports are logged and
/// skipped; chart failures only lose that chart.
pub fn analyze_report_dir(report_dir: &Path) -> Result<Vec<ReportAnalysis>> {
    let reports = find_reports(report_dir)
        .with_context(|| format!("listing reports in {}", report_dir.display()))?;
    let viz_dir = report_dir.join("visualizations");
    std::fs::create_dir_all(&viz_dir)
        .with_context(|| format!("creating {}", viz_dir.display()))?;

    let mut analyses = Vec::new();
    for report in reports {
        let slug = report_slug(&report).unwrap_or("report").to_string();
        log::info!("analyzing {}", report.display());

        let entries = match parse_report(&report) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("skipping malformed report: {err}");
                continue;
            }
        };
        if entries.is_empty() {
            log::warn!("no entries in {}, skipping", report.display());
            continue;
        }

        let files = file_attributes(&entries);
        let analysis = analyze(&files);
        let outputs = write_outputs(&viz_dir, &slug, &files, &analysis)?;
        analyses.push(ReportAnalysis {
            slug,
            analysis,
            outputs,
        });
    }
    Ok(analyses)
}

fn write_outputs(
    viz_dir: &Path,
    slug: &str,
    files: &FileAttributes,
    analysis: &OverlapAnalysis,
) -> Result<Vec<PathBuf>> {
    let mut outputs = Vec::new();

    let upset_path = viz_dir.join(format!("{slug}_upset_plot.png"));
    if files.len() > MAX_DIAGRAM_FILES {
        log::warn!(
            "{} files in {slug} report, diagram shows the {MAX_DIAGRAM_FILES} with most attributes",
            files.len()
        );
    }
    let diagram_files = largest_files(files, MAX_DIAGRAM_FILES);
    match chart::upset_chart(&upset_path, &diagram_files, MAX_DIAGRAM_GROUPS) {
        Ok(()) => outputs.push(upset_path),
        Err(err) => log::warn!("could not draw {}: {err:#}", upset_path.display()),
    }

    let freq_path = viz_dir.join(format!("{slug}_frequency.png"));
    match chart::frequency_chart(&freq_path, analysis.top(FREQUENCY_TOP_N)) {
        Ok(()) => outputs.push(freq_path),
        Err(err) => log::warn!("could not draw {}: {err:#}", freq_path.display()),
    }

    let summary_path = viz_dir.join(format!("{slug}_summary.txt"));
    let mut out = BufWriter::new(
        File::create(&summary_path).with_context(|| format!("creating {}", summary_path.display()))?,
    );
    summary::write_summary(&mut out, analysis)
        .and_then(|()| out.flush())
        .with_context(|| format!("writing {}", summary_path.display()))?;
    outputs.push(summary_path);

    let json_path = viz_dir.join(format!("{slug}_analysis.json"));
    let json = serde_json::to_string_pretty(analysis).context("serializing analysis")?;
    std::fs::write(&json_path, json).with_context(|| format!("writing {}", json_path.display()))?;
    outputs.push(json_path);

    Ok(outputs)
}
