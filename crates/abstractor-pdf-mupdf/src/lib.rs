use std::path::Path;

use mupdf::{Document, TextPageFlags};

use abstractor_core::{BackendError, PdfBackend};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency so
/// that the rest of the workspace does not transitively depend on it.
///
/// Text is produced block by block and line by line, one `\n` per line, and
/// page texts are concatenated in page order without an extra separator.
/// Every page is kept, headers and footers included.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }

    fn page_text(page: &mupdf::Page) -> Result<String, mupdf::Error> {
        let text_page = page.to_text_page(TextPageFlags::empty())?;

        let mut text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                text.push('\n');
            }
        }
        Ok(text)
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        if !path.is_file() {
            return Err(BackendError::open(path, "not a regular file"));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::open(path, "invalid path encoding"))?;

        let document = Document::open(path_str).map_err(|e| BackendError::open(path, e))?;

        let mut text = String::new();
        let pages = document.pages().map_err(|e| BackendError::open(path, e))?;
        for (i, page_result) in pages.enumerate() {
            let page_text = page_result
                .and_then(|page| Self::page_text(&page))
                .map_err(|e| BackendError::page(path, i + 1, e))?;
            text.push_str(&page_text);
        }

        Ok(text)
    }
}
