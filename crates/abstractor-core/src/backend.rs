use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why an article's text could not be read. The orchestrator turns either
/// case into an empty article text and keeps going.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("cannot open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },
    /// Pages are numbered from 1.
    #[error("cannot read page {page} of {}: {reason}", path.display())]
    Page {
        path: PathBuf,
        page: usize,
        reason: String,
    },
}

impl BackendError {
    pub fn open(path: &Path, reason: impl ToString) -> Self {
        BackendError::Open {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn page(path: &Path, page: usize, reason: impl ToString) -> Self {
        BackendError::Page {
            path: path.to_path_buf(),
            page,
            reason: reason.to_string(),
        }
    }
}

/// Source of article text.
///
/// Implementors return the text of every page of the article, concatenated
/// in page order, with nothing trimmed or summarized.
pub trait PdfBackend: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}
