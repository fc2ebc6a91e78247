//! Schema fields.
//!
//! A [`Field`] is one typed, constrained column. Its main operation is
//! [`Field::read_cell`], which turns a raw cell into a typed value plus notes
//! describing every type or constraint failure.

use crate::constraints::ConstraintSet;
use crate::types::{read_value, write_value};
use crate::{Cell, Constraints, CoreError, FieldType, Value};
use serde::{Deserialize, Serialize};

/// Default missing values of a schema.
pub const DEFAULT_MISSING_VALUES: &[&str] = &[""];

/// Default true values of a boolean field.
pub const DEFAULT_TRUE_VALUES: &[&str] = &["true", "True", "TRUE", "1"];

/// Default false values of a boolean field.
pub const DEFAULT_FALSE_VALUES: &[&str] = &["false", "False", "FALSE", "0"];

/// Name of the note emitted when a cast fails.
pub const TYPE_NOTE: &str = "type";

/// Failure notes of a cast, keyed by `type` or a constraint name.
///
/// Notes keep their evaluation order so that errors derived from them are
/// reported in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Notes(Vec<(String, String)>);

impl Notes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a note.
    pub fn insert(&mut self, name: impl Into<String>, note: impl Into<String>) {
        let name = name.into();
        let note = note.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = note,
            None => self.0.push((name, note)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, note)| note.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, note)| (name.as_str(), note.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `None` when empty, the contract of `read_cell`/`write_cell`.
    fn into_option(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }
}

fn is_default_format(format: &str) -> bool {
    format.is_empty() || format == "default"
}

/// A single field definition in a schema.
///
/// # Example
///
/// ```rust
/// use tabular_core::{Field, FieldType, Value};
/// use serde_json::json;
///
/// let field = Field::new("id", FieldType::Integer);
/// assert_eq!(field.read_cell(&json!("1")), (Some(Value::Integer(1)), None));
/// assert_eq!(field.read_cell(&json!("")), (None, None));
/// assert!(field.read_cell(&json!("a")).1.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field name, unique within a schema
    #[serde(default)]
    pub name: String,

    /// Declared type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    /// Type format: `default`, `any`, a strftime pattern or a type-specific tag
    #[serde(default, skip_serializing_if = "is_default_format")]
    pub format: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Field-level override of the schema's missing values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,

    /// Boolean: strings read as `true`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub true_values: Option<Vec<String>>,

    /// Boolean: strings read as `false`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub false_values: Option<Vec<String>>,

    /// Number/integer: when false, currency and percent symbols are stripped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bare_number: Option<bool>,

    /// Number: read as binary float instead of exact decimal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub float_number: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_char: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_char: Option<String>,

    /// Array: sub-field every item is cast through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_item: Option<Box<Field>>,
}

impl Field {
    /// Creates a field with the default format and no constraints.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            format: "default".to_string(),
            ..Default::default()
        }
    }

    pub fn format(&self) -> &str {
        if self.format.is_empty() {
            "default"
        } else {
            &self.format
        }
    }

    pub fn required(&self) -> bool {
        self.constraints.required
    }

    pub fn true_values(&self) -> Vec<&str> {
        match &self.true_values {
            Some(values) => values.iter().map(String::as_str).collect(),
            None => DEFAULT_TRUE_VALUES.to_vec(),
        }
    }

    pub fn false_values(&self) -> Vec<&str> {
        match &self.false_values {
            Some(values) => values.iter().map(String::as_str).collect(),
            None => DEFAULT_FALSE_VALUES.to_vec(),
        }
    }

    pub fn bare_number(&self) -> bool {
        self.bare_number.unwrap_or(true)
    }

    pub fn float_number(&self) -> bool {
        self.float_number.unwrap_or(false)
    }

    pub fn decimal_char(&self) -> &str {
        self.decimal_char.as_deref().unwrap_or(".")
    }

    pub fn group_char(&self) -> &str {
        self.group_char.as_deref().unwrap_or("")
    }

    /// Note emitted when a cell does not cast, e.g. `type is "integer/default"`.
    pub fn type_note(&self) -> String {
        format!("type is \"{}/{}\"", self.field_type, self.format())
    }

    /// Casts a raw cell, using the field's own missing values (or the
    /// defaults).
    ///
    /// Returns the typed value (or `None`) and the failure notes (or `None`
    /// on success). Missing values are never type errors; only `required`
    /// can fire on them.
    pub fn read_cell(&self, cell: &Cell) -> (Option<Value>, Option<Notes>) {
        self.cell_reader(None).read(cell)
    }

    /// Serializes a typed value back to its canonical string.
    pub fn write_cell(&self, value: Option<&Value>) -> (Option<String>, Option<Notes>) {
        let Some(value) = value else {
            let missing = self
                .missing_values
                .as_ref()
                .and_then(|values| values.first().cloned())
                .unwrap_or_default();
            return (Some(missing), None);
        };
        match write_value(self, value) {
            Some(text) => (Some(text), None),
            None => {
                let mut notes = Notes::new();
                notes.insert(TYPE_NOTE, self.type_note());
                (None, Some(notes))
            }
        }
    }

    /// Builds a reusable reader; `schema_missing_values` applies unless the
    /// field overrides it.
    pub fn cell_reader(&self, schema_missing_values: Option<&[String]>) -> CellReader {
        let missing_values = match (&self.missing_values, schema_missing_values) {
            (Some(values), _) => values.clone(),
            (None, Some(values)) => values.to_vec(),
            (None, None) => DEFAULT_MISSING_VALUES.iter().map(|v| v.to_string()).collect(),
        };
        CellReader {
            constraints: ConstraintSet::compile(self),
            field: self.clone(),
            missing_values,
        }
    }

    /// Problems with the field descriptor itself.
    pub fn metadata_errors(&self) -> Vec<CoreError> {
        let mut errors = Vec::new();
        let error = |message: String| CoreError::field(&self.name, message);

        let supported = self.field_type.supported_constraints();
        for name in self.constraints.declared() {
            if !supported.contains(&name) {
                errors.push(error(format!(
                    "constraint \"{name}\" is not supported by type \"{}\"",
                    self.field_type
                )));
            }
        }

        if let Some(pattern) = &self.constraints.pattern
            && regex::Regex::new(pattern).is_err()
        {
            errors.push(error(format!("constraint \"pattern\" is not a valid regex: {pattern}")));
        }

        let bounds = [
            ("minimum", &self.constraints.minimum),
            ("maximum", &self.constraints.maximum),
            ("exclusiveMinimum", &self.constraints.exclusive_minimum),
            ("exclusiveMaximum", &self.constraints.exclusive_maximum),
        ];
        for (name, bound) in bounds {
            if let Some(bound) = bound
                && supported.contains(&name)
                && read_value(self, bound).is_none()
            {
                errors.push(error(format!(
                    "constraint \"{name}\" value \"{}\" is not a valid {}",
                    crate::stringify_cell(bound),
                    self.field_type
                )));
            }
        }
        for member in self.constraints.enum_values.iter().flatten() {
            if read_value(self, member).is_none() {
                errors.push(error(format!(
                    "constraint \"enum\" member \"{}\" is not a valid {}",
                    crate::stringify_cell(member),
                    self.field_type
                )));
            }
        }

        if matches!(
            self.field_type,
            FieldType::Date | FieldType::Datetime | FieldType::Time
        ) && !matches!(self.format(), "default" | "any")
            && !crate::types::is_valid_pattern(self.format())
        {
            errors.push(error(format!("format \"{}\" is not a valid pattern", self.format)));
        }

        if self.field_type == FieldType::String
            && !crate::types::STRING_FORMATS.contains(&self.format())
        {
            errors.push(error(format!("format \"{}\" is not supported", self.format)));
        }

        if self.field_type == FieldType::Number && self.decimal_char() == self.group_char() {
            errors.push(error("decimalChar and groupChar must differ".to_string()));
        }

        if let Some(item) = &self.array_item {
            if item.field_type == FieldType::Array {
                errors.push(error("arrayItem cannot be an array".to_string()));
            }
            errors.extend(item.metadata_errors());
        }

        errors
    }
}

/// Compiled reader for one field: the field, its effective missing values
/// and its compiled constraints.
#[derive(Debug, Clone)]
pub struct CellReader {
    field: Field,
    missing_values: Vec<String>,
    constraints: ConstraintSet,
}

impl CellReader {
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn missing_values(&self) -> &[String] {
        &self.missing_values
    }

    /// Whether the raw cell counts as missing (absent, null or a sentinel).
    pub fn is_missing(&self, cell: &Cell) -> bool {
        match cell {
            Cell::Null => true,
            Cell::String(text) => self.missing_values.iter().any(|value| value == text),
            _ => false,
        }
    }

    /// See [`Field::read_cell`].
    pub fn read(&self, cell: &Cell) -> (Option<Value>, Option<Notes>) {
        let mut notes = Notes::new();
        if self.is_missing(cell) {
            self.constraints.check_missing(&mut notes);
            return (None, notes.into_option());
        }

        let Some(value) = read_value(&self.field, cell) else {
            notes.insert(TYPE_NOTE, self.field.type_note());
            return (None, Some(notes));
        };

        self.constraints.check(&value, &mut notes);
        (Some(value), notes.into_option())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_field_descriptor_round_trip() {
        let descriptor = json!({
            "name": "price",
            "type": "number",
            "decimalChar": ",",
            "constraints": {"required": true, "minimum": 0}
        });
        let field: Field = serde_json::from_value(descriptor.clone()).unwrap();
        assert_eq!(field.field_type, FieldType::Number);
        assert_eq!(field.format(), "default");
        assert_eq!(field.decimal_char(), ",");
        assert!(field.required());
        assert_eq!(serde_json::to_value(&field).unwrap(), descriptor);
    }

    #[test]
    fn test_missing_values_never_type_error() {
        for field_type in FieldType::INFERENCE_ORDER {
            let field = Field::new("value", field_type);
            assert_eq!(field.read_cell(&json!("")), (None, None), "{field_type}");
            assert_eq!(field.read_cell(&json!(null)), (None, None), "{field_type}");
        }
    }

    #[test]
    fn test_schema_missing_values_apply() {
        let field = Field::new("value", FieldType::Integer);
        let reader = field.cell_reader(Some(&["NA".to_string()]));
        assert_eq!(reader.read(&json!("NA")), (None, None));
        assert!(reader.read(&json!("")).1.is_some());
    }

    #[test]
    fn test_write_cell_type_mismatch() {
        let field = Field::new("id", FieldType::Integer);
        assert_eq!(field.write_cell(Some(&Value::Integer(7))), (Some("7".into()), None));
        let (text, notes) = field.write_cell(Some(&Value::Boolean(true)));
        assert_eq!(text, None);
        assert_eq!(notes.unwrap().get(TYPE_NOTE), Some("type is \"integer/default\""));
        assert_eq!(field.write_cell(None), (Some(String::new()), None));
    }

    #[test]
    fn test_metadata_errors() {
        let field: Field = serde_json::from_value(json!({
            "name": "id",
            "type": "integer",
            "constraints": {"pattern": "[", "minimum": "abc"}
        }))
        .unwrap();
        let errors = field.metadata_errors();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|error| error.code() == "field-error"));

        let field: Field =
            serde_json::from_value(json!({"name": "day", "type": "date", "format": "%Q"}))
                .unwrap();
        assert_eq!(field.metadata_errors().len(), 1);

        assert!(Field::new("id", FieldType::Integer).metadata_errors().is_empty());
    }

    #[test]
    fn test_notes_keep_order_and_replace() {
        let mut notes = Notes::new();
        notes.insert("b", "1");
        notes.insert("a", "2");
        notes.insert("b", "3");
        let collected: Vec<_> = notes.iter().collect();
        assert_eq!(collected, vec![("b", "3"), ("a", "2")]);
    }
}
