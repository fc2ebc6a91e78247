//! Field constraints.
//!
//! [`Constraints`] is the declarative part stored in a field descriptor.
//! [`ConstraintSet`] is its compiled form: bounds and enum members already
//! cast through the field type, the pattern already compiled.

use crate::types::read_value;
use crate::{Cell, Field, Notes, Value, stringify_cell};
use regex::Regex;
use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !value
}

/// Declared constraints of a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    /// A missing value is an error
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    /// Values must be unique within the resource
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Cell>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Cell>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Cell>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Cell>,

    /// Regular expression the whole string must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Allowed values
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Cell>>,
}

impl Constraints {
    /// Returns true when no constraint is declared.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the declared constraints, in evaluation order.
    pub fn declared(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.required {
            names.push("required");
        }
        if self.unique {
            names.push("unique");
        }
        let optional: [(&'static str, bool); 8] = [
            ("minLength", self.min_length.is_some()),
            ("maxLength", self.max_length.is_some()),
            ("minimum", self.minimum.is_some()),
            ("maximum", self.maximum.is_some()),
            ("exclusiveMinimum", self.exclusive_minimum.is_some()),
            ("exclusiveMaximum", self.exclusive_maximum.is_some()),
            ("pattern", self.pattern.is_some()),
            ("enum", self.enum_values.is_some()),
        ];
        names.extend(
            optional
                .into_iter()
                .filter(|(_, declared)| *declared)
                .map(|(name, _)| name),
        );
        names
    }
}

/// A bound cast through the field type, with the raw text used in notes.
#[derive(Debug, Clone)]
struct Bound {
    value: Value,
    text: String,
}

impl Bound {
    fn compile(field: &Field, cell: Option<&Cell>) -> Option<Self> {
        let cell = cell?;
        Some(Self {
            value: read_value(field, cell)?,
            text: stringify_cell(cell),
        })
    }
}

/// Compiled constraints of one field.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    minimum: Option<Bound>,
    maximum: Option<Bound>,
    exclusive_minimum: Option<Bound>,
    exclusive_maximum: Option<Bound>,
    pattern: Option<(Regex, String)>,
    enum_values: Option<(Vec<Value>, String)>,
}

impl ConstraintSet {
    /// Compiles the constraints supported by the field's type.
    ///
    /// Constraints that cannot be compiled (an unsupported constraint, a bad
    /// pattern, a bound that does not cast) are left out here; they are
    /// reported by [`Field::metadata_errors`].
    pub fn compile(field: &Field) -> Self {
        let supported = field.field_type.supported_constraints();
        let declared = &field.constraints;
        let allowed = |name: &str| supported.contains(&name);

        let mut set = ConstraintSet {
            required: declared.required,
            ..Default::default()
        };
        if allowed("minLength") {
            set.min_length = declared.min_length;
        }
        if allowed("maxLength") {
            set.max_length = declared.max_length;
        }
        if allowed("minimum") {
            set.minimum = Bound::compile(field, declared.minimum.as_ref());
            set.maximum = Bound::compile(field, declared.maximum.as_ref());
            set.exclusive_minimum = Bound::compile(field, declared.exclusive_minimum.as_ref());
            set.exclusive_maximum = Bound::compile(field, declared.exclusive_maximum.as_ref());
        }
        if allowed("pattern") {
            set.pattern = declared.pattern.as_ref().and_then(|pattern| {
                Regex::new(&format!("^(?:{pattern})$"))
                    .ok()
                    .map(|regex| (regex, pattern.clone()))
            });
        }
        if let Some(members) = &declared.enum_values {
            let values = members
                .iter()
                .filter_map(|member| read_value(field, member))
                .collect();
            set.enum_values = Some((values, Cell::Array(members.clone()).to_string()));
        }
        set
    }

    /// Whether a missing value violates the constraints.
    pub fn check_missing(&self, notes: &mut Notes) {
        if self.required {
            notes.insert("required", constraint_note("required", "true"));
        }
    }

    /// Evaluates every constraint against a cast value, adding one note per
    /// violation.
    pub fn check(&self, value: &Value, notes: &mut Notes) {
        if let Some(length) = value.length() {
            if let Some(min) = self.min_length.filter(|min| length < *min) {
                notes.insert("minLength", constraint_note("minLength", &min.to_string()));
            }
            if let Some(max) = self.max_length.filter(|max| length > *max) {
                notes.insert("maxLength", constraint_note("maxLength", &max.to_string()));
            }
        }

        let bounds = [
            ("minimum", &self.minimum, Violation::Below),
            ("maximum", &self.maximum, Violation::Above),
            ("exclusiveMinimum", &self.exclusive_minimum, Violation::AtOrBelow),
            ("exclusiveMaximum", &self.exclusive_maximum, Violation::AtOrAbove),
        ];
        for (name, bound, violation) in bounds {
            if let Some(bound) = bound
                && violation.applies(value, &bound.value)
            {
                notes.insert(name, constraint_note(name, &bound.text));
            }
        }

        if let (Some((regex, pattern)), Value::String(text)) = (&self.pattern, value)
            && !regex.is_match(text)
        {
            notes.insert("pattern", constraint_note("pattern", pattern));
        }

        if let Some((members, text)) = &self.enum_values
            && !members.contains(value)
        {
            notes.insert("enum", constraint_note("enum", text));
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Violation {
    Below,
    Above,
    AtOrBelow,
    AtOrAbove,
}

impl Violation {
    fn applies(self, value: &Value, bound: &Value) -> bool {
        use std::cmp::Ordering::*;
        match (self, value.partial_cmp(bound)) {
            (Violation::Below, Some(Less)) => true,
            (Violation::Above, Some(Greater)) => true,
            (Violation::AtOrBelow, Some(Less | Equal)) => true,
            (Violation::AtOrAbove, Some(Greater | Equal)) => true,
            _ => false,
        }
    }
}

fn constraint_note(name: &str, value: &str) -> String {
    format!("constraint \"{name}\" is \"{value}\"")
}

#[cfg(test)]
mod tests {
    use crate::{Field, FieldType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field(field_type: &str, constraints: serde_json::Value) -> Field {
        serde_json::from_value(json!({
            "name": "value",
            "type": field_type,
            "constraints": constraints,
        }))
        .unwrap()
    }

    fn failed(field: &Field, cell: serde_json::Value) -> Vec<String> {
        let (_, notes) = field.read_cell(&cell);
        notes
            .map(|notes| notes.iter().map(|(name, _)| name.to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_required_fires_on_missing_value() {
        let required = field("integer", json!({"required": true}));
        let (value, notes) = required.read_cell(&json!(""));
        assert_eq!(value, None);
        assert_eq!(
            notes.unwrap().get("required"),
            Some("constraint \"required\" is \"true\"")
        );
        assert_eq!(failed(&required, json!("1")), Vec::<String>::new());
    }

    #[test]
    fn test_numeric_bounds() {
        let bounded = field("integer", json!({"minimum": 1, "maximum": "10"}));
        assert_eq!(failed(&bounded, json!("0")), vec!["minimum"]);
        assert_eq!(failed(&bounded, json!("11")), vec!["maximum"]);
        assert!(failed(&bounded, json!("10")).is_empty());

        let exclusive = field("number", json!({"exclusiveMinimum": 1, "exclusiveMaximum": 2}));
        assert_eq!(failed(&exclusive, json!("1")), vec!["exclusiveMinimum"]);
        assert!(failed(&exclusive, json!("1.5")).is_empty());
    }

    #[test]
    fn test_date_bounds_are_cast() {
        let bounded = field("date", json!({"minimum": "2020-01-01"}));
        assert_eq!(failed(&bounded, json!("2019-12-31")), vec!["minimum"]);
        assert!(failed(&bounded, json!("2020-01-01")).is_empty());
    }

    #[test]
    fn test_all_constraints_are_evaluated() {
        let text = field(
            "string",
            json!({"minLength": 5, "pattern": "[a-z]+", "enum": ["alpha", "beta"]}),
        );
        assert_eq!(failed(&text, json!("AB")), vec!["minLength", "pattern", "enum"]);
        assert!(failed(&text, json!("alpha")).is_empty());
    }

    #[test]
    fn test_pattern_is_anchored() {
        let text = field("string", json!({"pattern": "a+"}));
        assert_eq!(failed(&text, json!("baa")), vec!["pattern"]);
    }

    #[test]
    fn test_type_failure_skips_constraints() {
        let bounded = field("integer", json!({"minimum": 1}));
        let (value, notes) = bounded.read_cell(&json!("x"));
        assert_eq!(value, None);
        let notes = notes.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes.get("type"), Some("type is \"integer/default\""));
    }

    #[test]
    fn test_enum_members_are_cast() {
        let members = field("integer", json!({"enum": ["1", 2]}));
        assert!(failed(&members, json!("2")).is_empty());
        assert_eq!(failed(&members, json!("3")), vec!["enum"]);
        let declared = members.constraints.declared();
        assert_eq!(declared, vec!["enum"]);
        assert_eq!(members.field_type, FieldType::Integer);
    }
}
