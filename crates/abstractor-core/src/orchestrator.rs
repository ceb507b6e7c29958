//! Sequential directory pipeline: extract → complete → parse → record.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::backend::PdfBackend;
use crate::llm::CompletionClient;
use crate::parse::parse_response;
use crate::prompt::{SYSTEM_INSTRUCTION, compose_prompt};
use crate::record::{ArticleRecord, build_record};
use crate::{ProgressEvent, RunConfig, RunError, RunOutcome, RunStats};

/// List the PDFs directly inside `dir`: non-directory entries whose name ends
/// in `.pdf` (case-sensitive), sorted by name. Names need not be UTF-8.
pub fn list_pdf_files(dir: &Path) -> Result<Vec<PathBuf>, RunError> {
    let entries = std::fs::read_dir(dir).map_err(|source| RunError::InputDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_name().as_encoded_bytes().ends_with(b".pdf") {
            continue;
        }
        match entry.file_type() {
            Ok(t) if t.is_dir() => {}
            Ok(_) => pdfs.push(entry.path()),
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "cannot stat entry, skipping");
            }
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Process one article. Extraction and completion failures degrade to empty
/// strings; only the missing-field policy can fail the record. Returns `None`
/// when `cancel` fires while the completion is in flight.
#[allow(clippy::too_many_arguments)]
async fn process_article(
    path: &Path,
    file_name: &str,
    config: &RunConfig,
    backend: &dyn PdfBackend,
    client: &dyn CompletionClient,
    stats: &mut RunStats,
    progress: &impl Fn(ProgressEvent),
    cancel: &CancellationToken,
) -> Result<Option<ArticleRecord>, RunError> {
    let text = match backend.extract_text(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(file = file_name, error = %e, "PDF extraction failed, continuing with empty text");
            stats.extraction_failures += 1;
            progress(ProgressEvent::ExtractionFailed {
                file_name: file_name.to_string(),
                error: e.to_string(),
            });
            String::new()
        }
    };

    let prompt = compose_prompt(&config.topic, &text);
    let completion = tokio::select! {
        result = client.complete(SYSTEM_INSTRUCTION, &prompt) => result,
        _ = cancel.cancelled() => {
            tracing::info!(file = file_name, "cancelled while waiting for completion");
            return Ok(None);
        }
    };
    let response = match completion {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(file = file_name, client = client.name(), error = %e, "completion failed, continuing with empty response");
            stats.completion_failures += 1;
            progress(ProgressEvent::CompletionFailed {
                file_name: file_name.to_string(),
                error: e.to_string(),
            });
            String::new()
        }
    };

    let parsed = parse_response(&response);
    let record = build_record(parsed, file_name, &text, config.missing_fields)?;

    if !record.is_complete() {
        tracing::warn!(file = file_name, missing = record.missing.len(), "response is missing fields");
        stats.incomplete += 1;
        progress(ProgressEvent::MissingFields {
            file_name: file_name.to_string(),
            fields: record.missing.clone(),
        });
    }

    Ok(Some(record))
}

/// Summarize every PDF in `config.input_dir`, one at a time.
///
/// Returns the records in processing order. Under the strict missing-field
/// policy the first incomplete response aborts the run and every record
/// gathered so far is dropped. Cancelling abandons any in-flight completion,
/// processes no further articles and returns what has been recorded.
pub async fn summarize_directory(
    config: &RunConfig,
    backend: &dyn PdfBackend,
    client: &dyn CompletionClient,
    progress: impl Fn(ProgressEvent),
    cancel: CancellationToken,
) -> Result<RunOutcome, RunError> {
    let pdfs = list_pdf_files(&config.input_dir)?;
    let total = pdfs.len();
    let mut stats = RunStats {
        total,
        ..RunStats::default()
    };
    let mut records = Vec::with_capacity(total);
    let mut cancelled = false;

    tracing::info!(dir = %config.input_dir.display(), total, "starting run");

    for (index, path) in pdfs.iter().enumerate() {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        progress(ProgressEvent::Processing {
            index,
            total,
            file_name: file_name.clone(),
        });

        let Some(record) = process_article(
            path, &file_name, config, backend, client, &mut stats, &progress, &cancel,
        )
        .await?
        else {
            cancelled = true;
            break;
        };

        progress(ProgressEvent::Recorded {
            index,
            total,
            identifier: record.identifier.clone(),
        });
        records.push(record);
    }

    if cancelled {
        stats.cancelled = true;
        progress(ProgressEvent::Cancelled {
            processed: records.len(),
            total,
        });
    }

    stats.processed = records.len();
    Ok(RunOutcome { records, stats })
}
