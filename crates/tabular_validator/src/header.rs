//! Header labels aligned to schema fields.

use crate::{ErrorCode, TableError};
use tabular_core::Schema;

/// Labels of a table and the errors found aligning them to the schema.
///
/// Header errors never abort reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    labels: Vec<String>,
    field_names: Vec<String>,
    row_numbers: Vec<usize>,
    errors: Vec<TableError>,
}

impl Header {
    /// Aligns labels to fields by position.
    ///
    /// `synthesized` lists fields created for labels that matched no field
    /// during schema sync; they are reported as extra labels.
    pub fn new(
        labels: Vec<String>,
        schema: &Schema,
        row_numbers: Vec<usize>,
        synthesized: &[usize],
        ignore_case: bool,
    ) -> Self {
        let field_names: Vec<String> = schema.fields.iter().map(|field| field.name.clone()).collect();
        let mut header = Self {
            labels,
            field_names,
            row_numbers,
            errors: Vec::new(),
        };
        header.errors = header.collect_errors(synthesized, ignore_case);
        header
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn row_numbers(&self) -> &[usize] {
        &self.row_numbers
    }

    pub fn errors(&self) -> &[TableError] {
        &self.errors
    }

    /// Whether the table has no header at all.
    pub fn missing(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&self, code: ErrorCode, note: String, label: &str, field_name: &str, number: usize) -> TableError {
        TableError::label(
            code,
            note,
            self.labels.clone(),
            self.row_numbers.clone(),
            label,
            field_name,
            number,
        )
    }

    fn collect_errors(&self, synthesized: &[usize], ignore_case: bool) -> Vec<TableError> {
        if self.missing() {
            return Vec::new();
        }
        if self.labels.iter().all(|label| label.trim().is_empty()) {
            return vec![TableError::header(
                ErrorCode::BlankHeader,
                "",
                self.labels.clone(),
                self.row_numbers.clone(),
            )];
        }

        let mut errors = Vec::new();

        for (index, label) in self.labels.iter().enumerate().skip(self.field_names.len()) {
            errors.push(self.error(ErrorCode::ExtraLabel, String::new(), label, "", index + 1));
        }
        for &index in synthesized {
            if let Some(label) = self.labels.get(index) {
                errors.push(self.error(ErrorCode::ExtraLabel, String::new(), label, "", index + 1));
            }
        }

        for (index, name) in self.field_names.iter().enumerate().skip(self.labels.len()) {
            errors.push(self.error(ErrorCode::MissingLabel, String::new(), "", name, index + 1));
        }

        for (index, (label, name)) in self.labels.iter().zip(&self.field_names).enumerate() {
            let number = index + 1;
            if synthesized.contains(&index) {
                continue;
            }
            if label.is_empty() {
                errors.push(self.error(ErrorCode::BlankLabel, String::new(), "", name, number));
                continue;
            }

            let duplicates: Vec<String> = self.labels[..index]
                .iter()
                .enumerate()
                .filter(|(_, seen)| *seen == label)
                .map(|(position, _)| (position + 1).to_string())
                .collect();
            if !duplicates.is_empty() {
                let note = format!("at position \"{}\"", duplicates.join(", "));
                errors.push(self.error(ErrorCode::DuplicateLabel, note, label, name, number));
                continue;
            }

            let normalized = label.replace('\n', " ");
            let normalized = normalized.trim();
            let matches = if ignore_case {
                name.to_lowercase() == normalized.to_lowercase()
            } else {
                name == normalized
            };
            if !matches {
                errors.push(self.error(ErrorCode::IncorrectLabel, String::new(), label, name, number));
            }
        }

        errors
    }
}
