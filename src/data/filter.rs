use std::path::Path;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// File-name filter loaded from config.txt
// ---------------------------------------------------------------------------

/// Case-insensitive substring filter on file names.
///
/// An empty filter keeps every file. Otherwise a file is kept when its name
/// contains at least one of the configured substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter {
    /// Lowercased substrings, in file order.
    substrings: Vec<String>,
}

impl NameFilter {
    /// A filter that keeps everything.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Parse `config.txt` contents: one substring per line, `#` starts a
    /// comment line, blank lines are ignored and entries are trimmed.
    pub fn parse(text: &str) -> Self {
        let substrings = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .collect();
        NameFilter { substrings }
    }

    /// Load a filter file. A missing file means no filtering.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!(
                "filter file {} not found, processing all files",
                path.display()
            );
            return Ok(Self::match_all());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading filter file {}", path.display()))?;
        let filter = Self::parse(&text);
        log::info!(
            "loaded {} filter substring(s) from {}",
            filter.substrings.len(),
            path.display()
        );
        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        self.substrings.is_empty()
    }

    pub fn substrings(&self) -> &[String] {
        &self.substrings
    }

    /// Whether a file name passes the filter.
    pub fn matches(&self, file_name: &str) -> bool {
        if self.substrings.is_empty() {
            return true;
        }
        let name = file_name.to_lowercase();
        self.substrings.iter().any(|s| name.contains(s.as_str()))
    }
}
