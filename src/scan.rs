use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::data::filter::NameFilter;
use crate::data::handler::FileHandler;

/// Recursively collect files under `root` that some handler claims and whose
/// name passes `filter`.
///
/// Unreadable directory entries are logged and skipped. The result is sorted
/// so that duplicate resolution does not depend on filesystem order.
pub fn discover_files(
    root: &Path,
    handlers: &[Box<dyn FileHandler>],
    filter: &NameFilter,
) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !handlers.iter().any(|h| h.can_handle(path)) {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !filter.matches(&name) {
            log::debug!("filtered out {}", path.display());
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    files
}
