use std::io::Write;
use std::path::Path;

use abstractor_core::{ArticleRecord, Field, ProgressEvent, RunStats};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn field_list(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print a real-time progress event.
pub fn print_progress(
    w: &mut dyn Write,
    event: &ProgressEvent,
    color: ColorMode,
) -> std::io::Result<()> {
    match event {
        ProgressEvent::Processing {
            index,
            total,
            file_name,
        } => {
            writeln!(w, "[{}/{}] Processing {}...", index + 1, total, file_name)?;
        }
        ProgressEvent::ExtractionFailed { file_name, error } => {
            if color.enabled() {
                writeln!(
                    w,
                    "{} could not read {}: {}",
                    "WARNING:".yellow(),
                    file_name,
                    error
                )?;
            } else {
                writeln!(w, "WARNING: could not read {}: {}", file_name, error)?;
            }
        }
        ProgressEvent::CompletionFailed { file_name, error } => {
            if color.enabled() {
                writeln!(
                    w,
                    "{} no summary for {}: {}",
                    "WARNING:".yellow(),
                    file_name,
                    error
                )?;
            } else {
                writeln!(w, "WARNING: no summary for {}: {}", file_name, error)?;
            }
        }
        ProgressEvent::MissingFields { file_name, fields } => {
            let msg = format!("{} is missing: {}", file_name, field_list(fields));
            if color.enabled() {
                writeln!(w, "  {}", msg.dimmed())?;
            } else {
                writeln!(w, "  {}", msg)?;
            }
        }
        ProgressEvent::Recorded { .. } => {}
        ProgressEvent::Cancelled { processed, total } => {
            let msg = format!("Cancelled after {} of {} articles", processed, total);
            if color.enabled() {
                writeln!(w, "{}", msg.yellow())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
    }
    Ok(())
}

/// Print the location of the written output file.
pub fn print_written(w: &mut dyn Write, path: &Path, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "Data written to {}", path.display().bold())
    } else {
        writeln!(w, "Data written to {}", path.display())
    }
}

/// Print the end-of-run summary.
pub fn print_summary(
    w: &mut dyn Write,
    records: &[ArticleRecord],
    stats: &RunStats,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", "SUMMARY".bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "SUMMARY")?;
        writeln!(w, "{}", sep)?;
    }

    writeln!(w, "  PDFs found: {}", stats.total)?;
    if color.enabled() {
        writeln!(w, "  {} {}", "Summarized:".green(), stats.processed)?;
    } else {
        writeln!(w, "  Summarized: {}", stats.processed)?;
    }
    if stats.extraction_failures > 0 {
        if color.enabled() {
            writeln!(w, "  {} {}", "Unreadable PDFs:".yellow(), stats.extraction_failures)?;
        } else {
            writeln!(w, "  Unreadable PDFs: {}", stats.extraction_failures)?;
        }
    }
    if stats.completion_failures > 0 {
        if color.enabled() {
            writeln!(w, "  {} {}", "Failed completions:".red(), stats.completion_failures)?;
        } else {
            writeln!(w, "  Failed completions: {}", stats.completion_failures)?;
        }
    }
    if stats.incomplete > 0 {
        if color.enabled() {
            writeln!(w, "  {} {}", "Incomplete records:".yellow(), stats.incomplete)?;
        } else {
            writeln!(w, "  Incomplete records: {}", stats.incomplete)?;
        }
        for record in records.iter().filter(|r| !r.is_complete()) {
            let msg = format!("{}: {}", record.identifier, field_list(&record.missing));
            if color.enabled() {
                writeln!(w, "    {}", msg.dimmed())?;
            } else {
                writeln!(w, "    {}", msg)?;
            }
        }
    }
    if stats.cancelled {
        writeln!(w, "  Run was cancelled; output holds the articles processed so far")?;
    }

    writeln!(w)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use abstractor_core::{MissingFieldPolicy, build_record, parse_response};

    fn render(f: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn processing_line_is_one_based() {
        let event = ProgressEvent::Processing {
            index: 0,
            total: 2,
            file_name: "article1.pdf".into(),
        };
        let out = render(|w| print_progress(w, &event, ColorMode(false)));
        assert_eq!(out, "[1/2] Processing article1.pdf...\n");
    }

    #[test]
    fn missing_fields_are_listed_by_label() {
        let event = ProgressEvent::MissingFields {
            file_name: "a.pdf".into(),
            fields: vec![Field::Country, Field::Summary],
        };
        let out = render(|w| print_progress(w, &event, ColorMode(false)));
        assert!(out.contains("a.pdf is missing: Country, Summary"));
    }

    #[test]
    fn summary_lists_incomplete_records() {
        let records = vec![
            build_record(
                parse_response("- Title: Only a title\n"),
                "article1.pdf",
                "",
                MissingFieldPolicy::Lenient,
            )
            .unwrap(),
        ];
        let stats = RunStats {
            total: 1,
            processed: 1,
            incomplete: 1,
            ..Default::default()
        };
        let out = render(|w| print_summary(w, &records, &stats, ColorMode(false)));
        assert!(out.contains("PDFs found: 1"));
        assert!(out.contains("Incomplete records: 1"));
        assert!(out.contains("article1: Authors, Month-Year"));
        assert!(!out.contains("Failed completions"));
    }

    #[test]
    fn written_path_is_reported() {
        let out = render(|w| print_written(w, Path::new("summarized-pdfs.xlsx"), ColorMode(false)));
        assert_eq!(out, "Data written to summarized-pdfs.xlsx\n");
    }
}
