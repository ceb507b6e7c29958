//! Declarative field schema shared by the prompt composer and the response parser.
//!
//! Every metadata field the model is asked for appears exactly once in
//! [`SCHEMA`], in the order it is requested and listed in the response
//! template. The prompt text, the output template, the extraction patterns,
//! and the spreadsheet column headers are all derived from this table.

use std::fmt;

/// Marker that terminates the free-text summary block in a response.
pub const SUMMARY_SENTINEL: &str = "#####";

/// A metadata field extracted from the model's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Authors,
    MonthYear,
    Country,
    Citation,
    Disease,
    StudyType,
    Species,
    ScalesUsed,
    Participants,
    QualityOfLife,
    FunctionalAbility,
    TreatmentAdherence,
    Survival,
    Summary,
}

/// How much text after a field label belongs to the field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// The rest of the label's line (at least one character).
    Line,
    /// One arbitrary character, possibly a line break, then the rest of that
    /// line. Lets the value start on the line after the label.
    LineOrFollowing,
    /// Everything up to [`SUMMARY_SENTINEL`] or the end of the response.
    UntilSentinel,
}

impl Extent {
    /// Regex source matching `label` followed by `": "` and capturing the value
    /// in group 1.
    pub fn pattern(self, label: &str) -> String {
        let label = regex::escape(label);
        match self {
            Extent::Line => format!(r"{label}: (.+)"),
            Extent::LineOrFollowing => format!(r"{label}: ((?s:.)[^\n]*)"),
            Extent::UntilSentinel => format!(
                r"(?s){label}: (.+?)(?:{}|\z)",
                regex::escape(SUMMARY_SENTINEL)
            ),
        }
    }
}

/// One row of the schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    /// Literal label the model writes before the value (`- Title: ...`).
    pub label: &'static str,
    /// Spreadsheet column header.
    pub column: &'static str,
    /// What the prompt asks the model to provide.
    pub request: &'static str,
    pub extent: Extent,
    /// Whether strict mode aborts the run when the field is missing.
    pub required: bool,
}

pub static SCHEMA: [FieldSpec; 15] = [
    FieldSpec {
        field: Field::Title,
        label: "Title",
        column: "Title",
        request: "title",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::Authors,
        label: "Authors",
        column: "Authors",
        request: "author names",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::MonthYear,
        label: "Month-Year",
        column: "Month-Year",
        request: "month-year of publication",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::Country,
        label: "Country",
        column: "Country",
        request: "country",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::Citation,
        label: "Citation",
        column: "Citation",
        request: "citation in APA format",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::Disease,
        label: "Disease",
        column: "Disease",
        request: "chronic disease studied",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::StudyType,
        label: "Study Type",
        column: "Study Type",
        request: "type of research study",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::Species,
        label: "Species",
        column: "Species",
        request: "species studied (human, mouse, rat, other)",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::ScalesUsed,
        label: "Scales Used",
        column: "Scales",
        request: "scales used to measure hope/depression/anxiety/etc (list them in a single line separated by commas)",
        extent: Extent::LineOrFollowing,
        required: true,
    },
    FieldSpec {
        field: Field::Participants,
        label: "Participants",
        column: "Participants",
        request: "number of participants",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::QualityOfLife,
        label: "Quality of Life",
        column: "QoL",
        request: "was quality of life improved or worsened",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::FunctionalAbility,
        label: "Functional Ability",
        column: "Func Ability",
        request: "was functional ability improved or worsened",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::TreatmentAdherence,
        label: "Treatment Adherence",
        column: "Tx Adherence",
        request: "was treatment adherence improved or worsened",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::Survival,
        label: "Survival",
        column: "Survival",
        request: "was survival impacted",
        extent: Extent::Line,
        required: true,
    },
    FieldSpec {
        field: Field::Summary,
        label: "Summary",
        column: "Summary",
        request: "a brief summary including the following information: methods, results, clinical significance, and any limitations of the study",
        extent: Extent::UntilSentinel,
        required: true,
    },
];

impl Field {
    /// All fields in schema order.
    pub const ALL: [Field; 15] = [
        Field::Title,
        Field::Authors,
        Field::MonthYear,
        Field::Country,
        Field::Citation,
        Field::Disease,
        Field::StudyType,
        Field::Species,
        Field::ScalesUsed,
        Field::Participants,
        Field::QualityOfLife,
        Field::FunctionalAbility,
        Field::TreatmentAdherence,
        Field::Survival,
        Field::Summary,
    ];

    pub fn spec(self) -> &'static FieldSpec {
        // SCHEMA is declared in the same order as the enum.
        &SCHEMA[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn column(self) -> &'static str {
        self.spec().column
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashSet;

    #[test]
    fn schema_order_matches_enum() {
        for (i, spec) in SCHEMA.iter().enumerate() {
            assert_eq!(spec.field as usize, i, "{} out of place", spec.label);
            assert_eq!(Field::ALL[i], spec.field);
        }
    }

    #[test]
    fn labels_and_columns_are_unique() {
        let labels: HashSet<_> = SCHEMA.iter().map(|s| s.label).collect();
        let columns: HashSet<_> = SCHEMA.iter().map(|s| s.column).collect();
        assert_eq!(labels.len(), SCHEMA.len());
        assert_eq!(columns.len(), SCHEMA.len());
    }

    #[test]
    fn only_summary_runs_to_sentinel() {
        let blocks: Vec<_> = SCHEMA
            .iter()
            .filter(|s| s.extent == Extent::UntilSentinel)
            .map(|s| s.field)
            .collect();
        assert_eq!(blocks, vec![Field::Summary]);
        assert_eq!(Field::ScalesUsed.spec().extent, Extent::LineOrFollowing);
    }

    #[test]
    fn every_pattern_compiles() {
        for spec in &SCHEMA {
            let source = spec.extent.pattern(spec.label);
            assert!(Regex::new(&source).is_ok(), "bad pattern {source}");
        }
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(Field::MonthYear.to_string(), "Month-Year");
        assert_eq!(Field::QualityOfLife.column(), "QoL");
    }
}
