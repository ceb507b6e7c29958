use std::path::PathBuf;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod backend;
pub mod config_file;
pub mod llm;
pub mod orchestrator;
pub mod parse;
pub mod prompt;
pub mod record;
pub mod schema;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use llm::{CompletionClient, LlmError, MockClient, OpenAiClient};
pub use orchestrator::list_pdf_files;
pub use parse::{ParsedFields, parse_response};
pub use record::{
    ArticleRecord, COLUMNS, Column, MissingFieldPolicy, RecordError, build_record,
};
pub use schema::{Field, SCHEMA};

/// Progress events emitted while a directory is summarized.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Processing {
        index: usize,
        total: usize,
        file_name: String,
    },
    ExtractionFailed {
        file_name: String,
        error: String,
    },
    CompletionFailed {
        file_name: String,
        error: String,
    },
    MissingFields {
        file_name: String,
        fields: Vec<Field>,
    },
    Recorded {
        index: usize,
        total: usize,
        identifier: String,
    },
    Cancelled {
        processed: usize,
        total: usize,
    },
}

/// Summary statistics for a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// PDFs found in the input directory.
    pub total: usize,
    /// Records produced.
    pub processed: usize,
    pub extraction_failures: usize,
    pub completion_failures: usize,
    /// Records with at least one missing field (lenient mode only).
    pub incomplete: usize,
    pub cancelled: bool,
}

/// Records and statistics from a finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub records: Vec<ArticleRecord>,
    pub stats: RunStats,
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("cannot read input directory {path}: {source}")]
    InputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Everything a run needs besides its backend and client. Built once before
/// the run and never changed afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    /// Subject of the literature review, inserted into the prompt.
    pub topic: String,
    pub missing_fields: MissingFieldPolicy,
}

impl RunConfig {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            topic: prompt::DEFAULT_TOPIC.to_string(),
            missing_fields: MissingFieldPolicy::default(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_missing_fields(mut self, policy: MissingFieldPolicy) -> Self {
        self.missing_fields = policy;
        self
    }
}

/// Summarize every PDF in the configured input directory.
///
/// Articles are processed strictly one after another. Progress events are
/// emitted via the callback. Cancellation takes effect between articles.
pub async fn summarize_directory(
    config: &RunConfig,
    backend: &dyn PdfBackend,
    client: &dyn CompletionClient,
    progress: impl Fn(ProgressEvent),
    cancel: CancellationToken,
) -> Result<RunOutcome, RunError> {
    orchestrator::summarize_directory(config, backend, client, progress, cancel).await
}
