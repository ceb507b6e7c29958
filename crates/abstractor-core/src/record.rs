//! Article records: one spreadsheet row per input PDF.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::parse::ParsedFields;
use crate::schema::Field;

/// What to do when a required field is absent from the parsed response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingFieldPolicy {
    /// Leave the cell empty and list the field in [`ArticleRecord::missing`].
    #[default]
    Lenient,
    /// Fail the record, which aborts the whole run.
    Strict,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("{identifier}: field \"{field}\" missing from model response")]
    MissingField { identifier: String, field: Field },
}

/// A spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Identifier,
    Field(Field),
    Excluded,
    Text,
}

/// Declared column order shared by every writer.
pub const COLUMNS: [Column; 18] = [
    Column::Identifier,
    Column::Field(Field::Title),
    Column::Field(Field::Authors),
    Column::Field(Field::MonthYear),
    Column::Field(Field::Country),
    Column::Field(Field::StudyType),
    Column::Field(Field::Species),
    Column::Field(Field::Participants),
    Column::Field(Field::ScalesUsed),
    Column::Field(Field::Disease),
    Column::Field(Field::QualityOfLife),
    Column::Field(Field::FunctionalAbility),
    Column::Field(Field::TreatmentAdherence),
    Column::Field(Field::Survival),
    Column::Field(Field::Summary),
    Column::Excluded,
    Column::Field(Field::Citation),
    Column::Text,
];

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::Identifier => "PMID",
            Column::Field(field) => field.column(),
            Column::Excluded => "Excluded",
            Column::Text => "Text",
        }
    }
}

/// One processed article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    /// File name up to its first `.`.
    pub identifier: String,
    /// Extracted values; every schema field has an entry (empty when missing).
    pub fields: BTreeMap<Field, String>,
    pub excluded: bool,
    /// Raw PDF text with spreadsheet-illegal characters removed.
    pub text: String,
    /// Fields the parser did not find, in schema order.
    pub missing: Vec<Field>,
}

impl ArticleRecord {
    pub fn field(&self, field: Field) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn cell(&self, column: Column) -> &str {
        match column {
            Column::Identifier => &self.identifier,
            Column::Field(field) => self.field(field),
            Column::Excluded => {
                if self.excluded {
                    "1"
                } else {
                    "0"
                }
            }
            Column::Text => &self.text,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Identifier for a PDF: the file name up to (not including) its first `.`.
pub fn identifier_from_file_name(file_name: &str) -> &str {
    file_name
        .split_once('.')
        .map_or(file_name, |(stem, _)| stem)
}

/// Remove characters a spreadsheet cell cannot hold: C0 controls other than
/// tab, line feed and carriage return.
pub fn strip_illegal_chars(text: &str) -> String {
    static ILLEGAL: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").unwrap());
    ILLEGAL.replace_all(text, "").into_owned()
}

/// Assemble the record for one article.
///
/// Under [`MissingFieldPolicy::Strict`] the first required field missing in
/// declared column order is reported as an error.
pub fn build_record(
    parsed: ParsedFields,
    file_name: &str,
    raw_text: &str,
    policy: MissingFieldPolicy,
) -> Result<ArticleRecord, RecordError> {
    let identifier = identifier_from_file_name(file_name).to_string();

    if policy == MissingFieldPolicy::Strict {
        let first_missing = COLUMNS.iter().find_map(|column| match column {
            Column::Field(field) if field.spec().required && !parsed.contains_key(field) => {
                Some(*field)
            }
            _ => None,
        });
        if let Some(field) = first_missing {
            return Err(RecordError::MissingField { identifier, field });
        }
    }

    let missing: Vec<Field> = Field::ALL
        .into_iter()
        .filter(|f| !parsed.contains_key(f))
        .collect();

    let mut fields: BTreeMap<Field, String> = parsed.into_iter().collect();
    for field in &missing {
        fields.insert(*field, String::new());
    }

    Ok(ArticleRecord {
        identifier,
        fields,
        excluded: false,
        text: strip_illegal_chars(raw_text),
        missing,
    })
}
