use std::io::{self, Write};

use super::OverlapAnalysis;
use crate::report::{RULE, SEPARATOR};

/// Attribute column width in the frequency table.
const NAME_WIDTH: usize = 50;

/// Plain-text summary of one overlap analysis.
pub fn write_summary<W: Write>(out: &mut W, analysis: &OverlapAnalysis) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "ATTRIBUTE OVERLAP ANALYSIS SUMMARY")?;
    writeln!(out, "{RULE}\n")?;

    writeln!(out, "Total Files Analyzed: {}", analysis.total_files)?;
    writeln!(out, "Total Unique Attributes: {}", analysis.total_unique_attributes)?;
    writeln!(
        out,
        "Common Attributes (in ALL files): {}",
        analysis.common_attributes.len()
    )?;
    writeln!(
        out,
        "Unique Attributes (in ONE file only): {}\n",
        analysis.unique_attributes.len()
    )?;

    if analysis.common_attributes.is_empty() {
        writeln!(out, "No attributes are common to all files.\n")?;
    } else {
        section(out, "COMMON ATTRIBUTES (Present in ALL files)")?;
        for attr in &analysis.common_attributes {
            writeln!(out, "  • {attr}")?;
        }
        writeln!(out)?;
    }

    if !analysis.unique_attributes.is_empty() {
        section(out, "UNIQUE ATTRIBUTES (Present in only ONE file)")?;
        for (attr, file) in &analysis.unique_attributes {
            writeln!(out, "  • {attr}")?;
            writeln!(out, "      └─ {file}")?;
        }
        writeln!(out)?;
    }

    if !analysis.intersections.is_empty() {
        section(out, "OVERLAP GROUPS (attributes shared by exactly these files)")?;
        for (i, group) in analysis.intersections.iter().enumerate() {
            writeln!(
                out,
                "  {}. {} attribute(s) in {} file(s): {}",
                i + 1,
                group.attributes.len(),
                group.files.len(),
                group.files.join(", ")
            )?;
            writeln!(out, "      {}", group.attributes.join(", "))?;
        }
        writeln!(out)?;
    }

    section(out, "ATTRIBUTE FREQUENCY DISTRIBUTION")?;
    writeln!(out, "{:<NAME_WIDTH$} {:<10} {:<10}", "Attribute", "Files", "Percentage")?;
    writeln!(out, "{SEPARATOR}")?;
    for count in &analysis.attribute_counts {
        writeln!(
            out,
            "{:<NAME_WIDTH$} {:<10} {:.1}%",
            shorten(&count.attribute),
            count.files,
            analysis.percentage(count.files)
        )?;
    }
    Ok(())
}

fn section<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "{RULE}")
}

fn shorten(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        return name.to_string();
    }
    let mut short: String = name.chars().take(NAME_WIDTH - 3).collect();
    short.push_str("...");
    short
}
