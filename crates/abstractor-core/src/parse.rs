//! Extraction of labeled field values from a model response.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{Field, SCHEMA};

/// Field values found in a response, keyed by field. Fields whose label was
/// not found are absent.
pub type ParsedFields = HashMap<Field, String>;

static PATTERNS: Lazy<Vec<(Field, Regex)>> = Lazy::new(|| {
    SCHEMA
        .iter()
        .map(|spec| (spec.field, Regex::new(&spec.extent.pattern(spec.label)).unwrap()))
        .collect()
});

/// Apply every schema pattern to `response`.
///
/// The first match of each label wins and its captured value is trimmed.
/// Nothing is substituted for labels that do not match.
pub fn parse_response(response: &str) -> ParsedFields {
    let mut fields = ParsedFields::with_capacity(PATTERNS.len());
    for (field, re) in PATTERNS.iter() {
        if let Some(caps) = re.captures(response)
            && let Some(value) = caps.get(1)
        {
            fields.insert(*field, value.as_str().trim().to_string());
        }
    }
    fields
}
