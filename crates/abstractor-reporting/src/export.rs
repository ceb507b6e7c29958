use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use abstractor_core::{ArticleRecord, COLUMNS};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::ExportError;
use crate::xlsx::write_xlsx;

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Pick the format from a file extension; anything unrecognized is XLSX.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

/// Write all records to `path` in `format`, replacing any existing file.
pub fn export_records(
    records: &[ArticleRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Xlsx => write_xlsx(records, path),
        ExportFormat::Csv => write_text(path, &export_csv(records)),
        ExportFormat::Json => write_text(path, &export_json(records)?),
    }
}

fn write_text(path: &Path, content: &str) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Header line plus one line per record, columns in declared order.
pub fn export_csv(records: &[ArticleRecord]) -> String {
    let mut out = String::new();
    let header: Vec<String> = COLUMNS.iter().map(|c| csv_escape(c.header())).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for record in records {
        let row: Vec<String> = COLUMNS
            .iter()
            .map(|c| csv_escape(record.cell(*c)))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// A record serialized as an object whose keys follow the declared column order.
struct JsonRow<'a>(&'a ArticleRecord);

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(COLUMNS.len()))?;
        for column in COLUMNS {
            map.serialize_entry(column.header(), self.0.cell(column))?;
        }
        map.end()
    }
}

/// Pretty-printed JSON array with one object per record.
pub fn export_json(records: &[ArticleRecord]) -> Result<String, ExportError> {
    let rows: Vec<JsonRow<'_>> = records.iter().map(JsonRow).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}
