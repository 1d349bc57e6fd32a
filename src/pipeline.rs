use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::data::handler::FileHandler;
use crate::data::model::{FileGroup, FileKind, FileResult};
use crate::error::SurveyError;

/// What happened to one candidate file.
#[derive(Debug)]
pub enum FileOutcome {
    Processed(FileKind),
    /// A file with the same name (case-insensitive) was already processed.
    Duplicate(FileKind),
    Unsupported(SurveyError),
    Failed(FileKind, SurveyError),
}

/// State of one extraction run: the handlers, the names already processed,
/// and the buffered results per file kind.
pub struct ExtractionRun<'h> {
    handlers: &'h [Box<dyn FileHandler>],
    seen: HashSet<String>,
    groups: BTreeMap<FileKind, FileGroup>,
}

impl<'h> ExtractionRun<'h> {
    pub fn new(handlers: &'h [Box<dyn FileHandler>]) -> Self {
        Self {
            handlers,
            seen: HashSet::new(),
            groups: BTreeMap::new(),
        }
    }

    /// Process every path in order, returning one outcome per path.
    pub fn process_all<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<FileOutcome> {
        paths.iter().map(|path| self.process(path.as_ref())).collect()
    }

    /// Dispatch one file to the first handler that claims it.
    ///
    /// A name is only marked as seen after a successful extraction, so a
    /// same-named file elsewhere is still attempted when this one fails.
    pub fn process(&mut self, path: &Path) -> FileOutcome {
        let handlers = self.handlers;
        let Some(handler) = handlers.iter().find(|h| h.can_handle(path)) else {
            log::info!("unsupported file type: {}", path.display());
            return FileOutcome::Unsupported(SurveyError::UnsupportedFileType {
                path: path.to_path_buf(),
            });
        };
        let kind = handler.kind();
        let key = dedup_key(path);

        let group = self.groups.entry(kind).or_default();
        group.found += 1;

        if self.seen.contains(&key) {
            log::info!("duplicate name, skipping {}", path.display());
            group.duplicates += 1;
            return FileOutcome::Duplicate(kind);
        }

        match handler.extract(path) {
            Ok(extraction) => {
                let result = FileResult::new(path.to_path_buf(), extraction);
                if result.sample.is_none() {
                    log::info!("no complete sample in {}", path.display());
                }
                log::debug!("processed {}", path.display());
                self.seen.insert(key);
                group.results.push(result);
                FileOutcome::Processed(kind)
            }
            Err(err) => {
                let err = SurveyError::read_failure(path, &err);
                log::warn!("{err}");
                group.failures += 1;
                FileOutcome::Failed(kind, err)
            }
        }
    }

    pub fn groups(&self) -> &BTreeMap<FileKind, FileGroup> {
        &self.groups
    }

    /// Finish the run and hand over the buffered results.
    pub fn into_groups(self) -> BTreeMap<FileKind, FileGroup> {
        self.groups
    }
}

/// Lowercased base name used to detect repeats across directories.
fn dedup_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
