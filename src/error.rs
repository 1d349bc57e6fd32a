use std::path::PathBuf;

/// Errors surfaced by the survey library.
///
/// Everything except [`SurveyError::Io`] is local to one file: callers log it
/// and move on to the next one.
#[derive(thiserror::Error, Debug)]
pub enum SurveyError {
    /// No registered handler claims the file.
    #[error("unsupported file type: {}", path.display())]
    UnsupportedFileType { path: PathBuf },

    /// The file could not be opened or decoded.
    #[error("failed to read {}: {reason}", path.display())]
    ReadFailure { path: PathBuf, reason: String },

    /// A generated report does not follow the report layout.
    #[error("malformed report {}:{line}: {message}", path.display())]
    MalformedReport {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SurveyError {
    /// Fold a handler error (and its context chain) into a read failure.
    pub fn read_failure(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        SurveyError::ReadFailure {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }
}

pub type Result<T, E = SurveyError> = std::result::Result<T, E>;
