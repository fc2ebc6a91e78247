//! Inference of encoding, dialect and schema from samples.
//!
//! A [`Detector`] is an immutable configuration value; every detection is a
//! pure function of that configuration and the sample it is given.
//!
//! # Example
//!
//! ```rust
//! use tabular_core::{Dialect, FieldType};
//! use tabular_validator::Detector;
//! use serde_json::json;
//!
//! let detector = Detector::default();
//! let fragment = vec![vec![json!("1"), json!("english")], vec![json!("2"), json!("中国人")]];
//! let labels = vec!["id".to_string(), "name".to_string()];
//! let detected = detector.detect_schema(&fragment, &labels, None, &Dialect::new()).unwrap();
//! assert_eq!(detected.schema.fields[0].field_type, FieldType::Integer);
//! assert_eq!(detected.schema.fields[1].field_type, FieldType::String);
//! ```

use crate::{Result, TableError};
use chardetng::EncodingDetector;
use std::collections::{HashMap, HashSet};
use tabular_core::{
    Cell, CellReader, DEFAULT_FALSE_VALUES, DEFAULT_MISSING_VALUES, DEFAULT_TRUE_VALUES, Dialect,
    Field, FieldType, Schema,
};
use tracing::debug;

pub const DEFAULT_BUFFER_SIZE: usize = 10000;
pub const DEFAULT_SAMPLE_SIZE: usize = 100;
pub const DEFAULT_ENCODING: &str = "utf-8";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Detection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    /// Bytes buffered for encoding detection
    pub buffer_size: usize,
    /// Rows sampled for dialect and schema detection
    pub sample_size: usize,
    pub encoding_confidence: f64,
    pub default_encoding: String,
    /// Forces every inferred field to this type
    pub field_type: Option<FieldType>,
    /// Overrides the labels as field names
    pub field_names: Option<Vec<String>>,
    pub field_confidence: f64,
    pub field_float_numbers: bool,
    pub field_missing_values: Vec<String>,
    pub field_true_values: Vec<String>,
    pub field_false_values: Vec<String>,
    /// Align schema fields to header labels by name
    pub schema_sync: bool,
    /// Partial schema descriptor merged last
    pub schema_patch: Option<Cell>,
}

impl Default for Detector {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            encoding_confidence: 0.5,
            default_encoding: DEFAULT_ENCODING.to_string(),
            field_type: None,
            field_names: None,
            field_confidence: 0.9,
            field_float_numbers: false,
            field_missing_values: strings(DEFAULT_MISSING_VALUES),
            field_true_values: strings(DEFAULT_TRUE_VALUES),
            field_false_values: strings(DEFAULT_FALSE_VALUES),
            schema_sync: false,
            schema_patch: None,
        }
    }
}

/// A detected schema and the positions of fields synthesized for labels
/// that matched no field during schema sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDetection {
    pub schema: Schema,
    pub synthesized: Vec<usize>,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_encoding_confidence(mut self, confidence: f64) -> Self {
        self.encoding_confidence = confidence;
        self
    }

    pub fn with_default_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.default_encoding = encoding.into();
        self
    }

    pub fn with_field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_field_names(mut self, names: Vec<String>) -> Self {
        self.field_names = Some(names);
        self
    }

    pub fn with_field_confidence(mut self, confidence: f64) -> Self {
        self.field_confidence = confidence;
        self
    }

    pub fn with_field_float_numbers(mut self, float_numbers: bool) -> Self {
        self.field_float_numbers = float_numbers;
        self
    }

    pub fn with_field_missing_values(mut self, values: Vec<String>) -> Self {
        self.field_missing_values = values;
        self
    }

    pub fn with_field_true_values(mut self, values: Vec<String>) -> Self {
        self.field_true_values = values;
        self
    }

    pub fn with_field_false_values(mut self, values: Vec<String>) -> Self {
        self.field_false_values = values;
        self
    }

    pub fn with_schema_sync(mut self, sync: bool) -> Self {
        self.schema_sync = sync;
        self
    }

    pub fn with_schema_patch(mut self, patch: Cell) -> Self {
        self.schema_patch = Some(patch);
        self
    }

    /// Guesses the encoding of a byte buffer.
    ///
    /// A byte order mark decides first. Valid UTF-8 with non-ASCII content is
    /// `utf-8`; pure ASCII and low-confidence guesses fall back to the
    /// default encoding.
    pub fn detect_encoding(&self, buffer: &[u8]) -> String {
        if buffer.starts_with(&[0xEF, 0xBB, 0xBF]) {
            return "utf-8-sig".to_string();
        }
        if buffer.starts_with(&[0xFF, 0xFE]) || buffer.starts_with(&[0xFE, 0xFF]) {
            return "utf-16".to_string();
        }
        if buffer.is_ascii() {
            return self.default_encoding.clone();
        }
        match std::str::from_utf8(buffer) {
            Ok(_) => return "utf-8".to_string(),
            // a multi-byte character cut at the end of the buffer
            Err(error) if error.error_len().is_none() => return "utf-8".to_string(),
            Err(_) => {}
        }

        let mut detector = EncodingDetector::new();
        detector.feed(buffer, true);
        let (encoding, confident) = detector.guess_assess(None, true);
        let confidence = if confident { 1.0 } else { 0.0 };
        debug!("Guessed encoding {} (confident: {confident})", encoding.name());
        if confidence < self.encoding_confidence {
            return self.default_encoding.clone();
        }
        encoding.name().to_lowercase()
    }

    /// Completes a dialect from a row sample.
    ///
    /// An explicit dialect is kept as is. Otherwise the header row is the
    /// first non-comment row whose width is close to the average width; when
    /// no row qualifies, or the chosen row holds non-text cells, the table
    /// has no header.
    pub fn detect_dialect(&self, sample: &[Vec<Cell>], dialect: Option<&Dialect>) -> Dialect {
        if let Some(dialect) = dialect {
            return dialect.clone();
        }
        let mut dialect = Dialect::new();
        if sample.is_empty() {
            return dialect;
        }

        let total: usize = sample.iter().map(Vec::len).sum();
        let width = (total as f64 / sample.len() as f64).round() as usize;
        let drift = ((width as f64 * 0.1).round() as usize).max(1);
        let matches = width.saturating_sub(drift)..=width + drift;

        let header_row = sample.iter().enumerate().find_map(|(index, cells)| {
            let row_number = index + 1;
            (!dialect.is_comment_row(row_number, cells) && matches.contains(&cells.len()))
                .then_some(row_number)
        });

        match header_row {
            Some(row_number) if has_text_cells(&sample[row_number - 1]) => {
                dialect.header_rows = vec![row_number];
            }
            _ => dialect.header = false,
        }
        debug!(
            "Detected header rows {:?} (header: {})",
            dialect.header_rows, dialect.header
        );
        dialect
    }

    /// Field names from the explicit names or the labels: newlines become
    /// spaces, blanks become `field{n}` and duplicates get their count
    /// appended. Without either, `field1..n` for the fragment width.
    pub fn detect_field_names(&self, labels: &[String], fragment: &[Vec<Cell>]) -> Vec<String> {
        let source = self
            .field_names
            .as_deref()
            .filter(|names| !names.is_empty())
            .unwrap_or(labels);
        let mut names: Vec<String> = source
            .iter()
            .map(|label| label.replace('\n', " ").trim().to_string())
            .collect();
        if names.is_empty() {
            let width = fragment.first().map(Vec::len).unwrap_or(0);
            return (1..=width).map(|number| format!("field{number}")).collect();
        }

        for (index, name) in names.iter_mut().enumerate() {
            if name.is_empty() {
                *name = format!("field{}", index + 1);
            }
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        names
            .into_iter()
            .map(|name| {
                let count = seen.entry(name.clone()).or_insert(0);
                *count += 1;
                if *count > 1 {
                    format!("{name}{count}")
                } else {
                    name
                }
            })
            .collect()
    }

    /// Infers (or takes) a schema, then syncs it to the labels and applies
    /// the patch.
    pub fn detect_schema(
        &self,
        fragment: &[Vec<Cell>],
        labels: &[String],
        schema: Option<&Schema>,
        dialect: &Dialect,
    ) -> Result<SchemaDetection> {
        let mut schema = match schema {
            Some(schema) => schema.clone(),
            None => self.infer_schema(fragment, labels),
        };

        let mut synthesized = Vec::new();
        if self.schema_sync && !labels.is_empty() {
            synthesized = sync_schema(&mut schema, labels, dialect.header_case)?;
        }

        if let Some(patch) = &self.schema_patch {
            schema = schema.patch(patch)?;
        }

        Ok(SchemaDetection {
            schema,
            synthesized,
        })
    }

    fn infer_schema(&self, fragment: &[Vec<Cell>], labels: &[String]) -> Schema {
        let mut schema = Schema::new();
        if self.field_missing_values != DEFAULT_MISSING_VALUES {
            schema.missing_values = self.field_missing_values.clone();
        }

        let names = self.detect_field_names(labels, fragment);
        if self.field_type.is_some() || fragment.is_empty() {
            let field_type = self.field_type.unwrap_or_default();
            for name in names {
                schema.add_field(Field::new(name, field_type));
            }
            return schema;
        }

        let candidates: Vec<CellReader> = FieldType::INFERENCE_ORDER
            .iter()
            .map(|field_type| self.candidate(*field_type).cell_reader(None))
            .collect();
        let mut scores = vec![vec![0i64; candidates.len()]; names.len()];
        let mut max_scores = vec![fragment.len() as i64; names.len()];
        let mut inferred: Vec<Option<FieldType>> = vec![None; names.len()];
        let threshold = fragment.len() as f64 * (self.field_confidence - 1.0);

        for cells in fragment {
            for index in 0..names.len() {
                if inferred[index].is_some() {
                    continue;
                }
                let cell = cells.get(index).unwrap_or(&Cell::Null);
                let missing = self.is_missing(cell);
                if missing {
                    max_scores[index] -= 1;
                }
                for (position, candidate) in candidates.iter().enumerate() {
                    let score = &mut scores[index][position];
                    if (*score as f64) < threshold {
                        continue;
                    }
                    if !missing {
                        *score += if candidate.read(cell).1.is_none() { 1 } else { -1 };
                    }
                    if max_scores[index] > 0
                        && *score as f64 >= max_scores[index] as f64 * self.field_confidence
                    {
                        inferred[index] = Some(candidate.field().field_type);
                        break;
                    }
                }
            }
        }

        for (name, field_type) in names.into_iter().zip(inferred) {
            let mut field = self.candidate(field_type.unwrap_or_default());
            field.name = name;
            schema.add_field(field);
        }
        schema
    }

    fn candidate(&self, field_type: FieldType) -> Field {
        let mut field = Field::new("shared", field_type);
        match field_type {
            FieldType::Number if self.field_float_numbers => field.float_number = Some(true),
            FieldType::Boolean => {
                if self.field_true_values != DEFAULT_TRUE_VALUES {
                    field.true_values = Some(self.field_true_values.clone());
                }
                if self.field_false_values != DEFAULT_FALSE_VALUES {
                    field.false_values = Some(self.field_false_values.clone());
                }
            }
            _ => {}
        }
        field
    }

    fn is_missing(&self, cell: &Cell) -> bool {
        match cell {
            Cell::Null => true,
            Cell::String(text) => self.field_missing_values.contains(text),
            _ => false,
        }
    }
}

fn has_text_cells(cells: &[Cell]) -> bool {
    cells
        .iter()
        .all(|cell| matches!(cell, Cell::String(_) | Cell::Null))
}

/// Reorders fields to the label order. Labels without a field get an `any`
/// field (their positions are returned); required and primary key fields
/// without a label are appended.
fn sync_schema(schema: &mut Schema, labels: &[String], case_sensitive: bool) -> Result<Vec<usize>> {
    let normalize = |name: &str| {
        if case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    };
    let labels: Vec<String> = labels.iter().map(|label| normalize(label)).collect();
    let unique: HashSet<&String> = labels.iter().collect();
    if unique.len() != labels.len() {
        return Err(TableError::schema(
            "\"schema_sync\" requires unique labels in the header",
        ));
    }

    let primary_key: Vec<String> = schema.primary_key.iter().map(|name| normalize(name)).collect();
    let mut fields: Vec<(String, Field)> = schema
        .fields
        .drain(..)
        .map(|field| (normalize(&field.name), field))
        .collect();

    let mut synthesized = Vec::new();
    let mut synced = Vec::with_capacity(labels.len());
    for (position, label) in labels.iter().enumerate() {
        match fields.iter().position(|(name, _)| name == label) {
            Some(index) => synced.push(fields.remove(index).1),
            None => {
                synthesized.push(position);
                synced.push(Field::new(label.clone(), FieldType::Any));
            }
        }
    }
    for (name, field) in fields {
        if field.required() || primary_key.contains(&name) {
            synced.push(field);
        }
    }

    schema.fields = synced;
    Ok(synthesized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tabular_core::{FieldBuilder, SchemaBuilder};

    fn rows(rows: &[&[&str]]) -> Vec<Vec<Cell>> {
        rows.iter()
            .map(|cells| cells.iter().map(|cell| json!(cell)).collect())
            .collect()
    }

    fn labels(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|label| label.to_string()).collect()
    }

    fn types(schema: &Schema) -> Vec<FieldType> {
        schema.fields.iter().map(|field| field.field_type).collect()
    }

    #[test]
    fn test_detect_encoding() {
        let detector = Detector::default();
        assert_eq!(detector.detect_encoding(b"id,name\n1,english\n"), "utf-8");
        assert_eq!(detector.detect_encoding(b"\xEF\xBB\xBFid\n"), "utf-8-sig");
        assert_eq!(detector.detect_encoding(b"\xFF\xFEi\x00d\x00"), "utf-16");
        assert_eq!(detector.detect_encoding("id\n中国人\n".as_bytes()), "utf-8");
    }

    #[test]
    fn test_detect_encoding_truncated_utf8() {
        let bytes = "中国人".as_bytes();
        assert_eq!(Detector::default().detect_encoding(&bytes[..bytes.len() - 1]), "utf-8");
    }

    #[test]
    fn test_detect_encoding_ascii_uses_default() {
        let detector = Detector::default().with_default_encoding("latin-1");
        assert_eq!(detector.detect_encoding(b"id\n1\n"), "latin-1");
    }

    #[test]
    fn test_detect_encoding_low_confidence_uses_default() {
        let detector = Detector::default().with_encoding_confidence(1.5);
        assert_eq!(detector.detect_encoding(b"caf\xE9 cr\xE8me br\xFBl\xE9e\n"), "utf-8");
    }

    #[test]
    fn test_detect_dialect_skips_leading_rows() {
        let sample = rows(&[
            &["title"],
            &["id", "name", "code", "note"],
            &["1", "english", "en", ""],
            &["2", "german", "de", ""],
        ]);
        let dialect = Detector::default().detect_dialect(&sample, None);
        assert!(dialect.header);
        assert_eq!(dialect.header_rows, vec![2]);
    }

    #[test]
    fn test_detect_dialect_numeric_first_row_has_no_header() {
        let sample = vec![vec![json!(1), json!("a")], vec![json!(2), json!("b")]];
        let dialect = Detector::default().detect_dialect(&sample, None);
        assert!(!dialect.header);
    }

    #[test]
    fn test_detect_dialect_keeps_explicit() {
        let explicit = Dialect::new().with_header(false);
        let dialect = Detector::default().detect_dialect(&rows(&[&["id"]]), Some(&explicit));
        assert_eq!(dialect, explicit);
    }

    #[test]
    fn test_detect_field_names() {
        let detector = Detector::default();
        assert_eq!(
            detector.detect_field_names(&labels(&["id", "", "id", "multi\nline "]), &[]),
            labels(&["id", "field2", "id2", "multi line"])
        );
        assert_eq!(
            detector.detect_field_names(&[], &rows(&[&["1", "2"]])),
            labels(&["field1", "field2"])
        );
        let detector = detector.with_field_names(labels(&["a", "b"]));
        assert_eq!(detector.detect_field_names(&labels(&["x", "y"]), &[]), labels(&["a", "b"]));
    }

    #[test]
    fn test_infer_types() {
        let fragment = rows(&[
            &["1", "1.5", "true", "2020-01-01", "2020", "english", ""],
            &["2", "2.5", "false", "2020-01-02", "2021", "中国人", ""],
        ]);
        let names = labels(&["a", "b", "c", "d", "e", "f", "g"]);
        let detected = Detector::default()
            .detect_schema(&fragment, &names, None, &Dialect::new())
            .unwrap();
        assert_eq!(
            types(&detected.schema),
            vec![
                FieldType::Integer,
                FieldType::Number,
                FieldType::Boolean,
                FieldType::Date,
                FieldType::Integer,
                FieldType::String,
                FieldType::Any,
            ]
        );
    }

    #[test]
    fn test_infer_tolerates_outliers_under_confidence() {
        let mut fragment: Vec<Vec<Cell>> = (0..19).map(|n| vec![json!(n.to_string())]).collect();
        fragment.push(vec![json!("oops")]);
        let detector = Detector::default();
        let detected = detector
            .detect_schema(&fragment, &labels(&["n"]), None, &Dialect::new())
            .unwrap();
        assert_eq!(types(&detected.schema), vec![FieldType::Integer]);

        let strict = detector.with_field_confidence(1.0);
        let detected = strict
            .detect_schema(&fragment, &labels(&["n"]), None, &Dialect::new())
            .unwrap();
        assert_eq!(types(&detected.schema), vec![FieldType::String]);
    }

    #[test]
    fn test_forced_field_type_and_empty_fragment() {
        let detector = Detector::default().with_field_type(FieldType::String);
        let detected = detector
            .detect_schema(&rows(&[&["1"]]), &labels(&["id"]), None, &Dialect::new())
            .unwrap();
        assert_eq!(types(&detected.schema), vec![FieldType::String]);

        let detected = Detector::default()
            .detect_schema(&[], &labels(&["id"]), None, &Dialect::new())
            .unwrap();
        assert_eq!(types(&detected.schema), vec![FieldType::Any]);
    }

    #[test]
    fn test_custom_missing_values_go_to_schema() {
        let detector = Detector::default().with_field_missing_values(labels(&["", "n/a"]));
        let detected = detector
            .detect_schema(&rows(&[&["n/a"], &["1"]]), &labels(&["id"]), None, &Dialect::new())
            .unwrap();
        assert_eq!(detected.schema.missing_values, labels(&["", "n/a"]));
        assert_eq!(types(&detected.schema), vec![FieldType::Integer]);
    }

    #[test]
    fn test_schema_sync() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("name", FieldType::String).build())
            .field(FieldBuilder::new("id", FieldType::Integer).build())
            .field(FieldBuilder::new("code", FieldType::String).required(true).build())
            .field(FieldBuilder::new("unused", FieldType::String).build())
            .build();
        let detector = Detector::default().with_schema_sync(true);
        let detected = detector
            .detect_schema(&[], &labels(&["id", "name", "extra"]), Some(&schema), &Dialect::new())
            .unwrap();
        assert_eq!(detected.schema.field_names(), vec!["id", "name", "extra", "code"]);
        assert_eq!(detected.schema.fields[2].field_type, FieldType::Any);
        assert_eq!(detected.synthesized, vec![2]);
    }

    #[test]
    fn test_schema_sync_ignores_case() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("ID", FieldType::Integer).build())
            .build();
        let mut dialect = Dialect::new();
        dialect.header_case = false;
        let detected = Detector::default()
            .with_schema_sync(true)
            .detect_schema(&[], &labels(&["id"]), Some(&schema), &dialect)
            .unwrap();
        assert_eq!(detected.schema.field_names(), vec!["ID"]);
        assert!(detected.synthesized.is_empty());
    }

    #[test]
    fn test_schema_sync_duplicate_labels() {
        let error = Detector::default()
            .with_schema_sync(true)
            .detect_schema(&[], &labels(&["id", "id"]), Some(&Schema::new()), &Dialect::new())
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::SchemaError);
    }

    #[test]
    fn test_schema_patch() {
        let detector = Detector::default().with_schema_patch(json!({
            "primaryKey": ["id"],
            "fields": {"id": {"type": "string"}}
        }));
        let detected = detector
            .detect_schema(&rows(&[&["1"]]), &labels(&["id"]), None, &Dialect::new())
            .unwrap();
        assert_eq!(types(&detected.schema), vec![FieldType::String]);
        assert_eq!(detected.schema.primary_key, labels(&["id"]));
    }
}
