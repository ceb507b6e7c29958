//! Writers that turn article records into a single output file.

use thiserror::Error;

pub mod export;
pub mod xlsx;

pub use export::{ExportFormat, export_records};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown export format \"{0}\" (expected xlsx, csv or json)")]
    UnknownFormat(String),
}
