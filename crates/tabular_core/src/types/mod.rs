//! Field types and their cast/serialize rules.
//!
//! Every type is a pair of pure functions: a reader turning a raw [`Cell`]
//! into a [`Value`] (or `None` when the cell is not a valid value of the
//! type) and a writer turning a [`Value`] back into its canonical string.

mod boolean;
mod geo;
mod numeric;
mod structured;
mod temporal;
mod text;

use crate::{Cell, Field, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub(crate) use temporal::is_valid_pattern;
pub(crate) use text::STRING_FORMATS;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Any,
    Array,
    Boolean,
    Date,
    Datetime,
    Duration,
    Geojson,
    Geopoint,
    Integer,
    Number,
    Object,
    String,
    Time,
    Year,
    Yearmonth,
}

impl FieldType {
    /// Candidate order used by schema inference, most specific first.
    pub const INFERENCE_ORDER: [FieldType; 14] = [
        FieldType::Yearmonth,
        FieldType::Geopoint,
        FieldType::Duration,
        FieldType::Geojson,
        FieldType::Object,
        FieldType::Array,
        FieldType::Datetime,
        FieldType::Time,
        FieldType::Date,
        FieldType::Integer,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Year,
        FieldType::String,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Any => "any",
            FieldType::Array => "array",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Duration => "duration",
            FieldType::Geojson => "geojson",
            FieldType::Geopoint => "geopoint",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Object => "object",
            FieldType::String => "string",
            FieldType::Time => "time",
            FieldType::Year => "year",
            FieldType::Yearmonth => "yearmonth",
        }
    }

    /// Constraints that can be declared on a field of this type.
    pub fn supported_constraints(&self) -> &'static [&'static str] {
        const ORDERED: &[&str] = &[
            "required",
            "unique",
            "minimum",
            "maximum",
            "exclusiveMinimum",
            "exclusiveMaximum",
            "enum",
        ];
        const SIZED: &[&str] = &["required", "unique", "minLength", "maxLength", "enum"];
        match self {
            FieldType::Any
            | FieldType::Boolean
            | FieldType::Duration
            | FieldType::Geojson
            | FieldType::Geopoint => &["required", "unique", "enum"],
            FieldType::Array | FieldType::Object => SIZED,
            FieldType::String => &[
                "required",
                "unique",
                "minLength",
                "maxLength",
                "pattern",
                "enum",
            ],
            FieldType::Date
            | FieldType::Datetime
            | FieldType::Integer
            | FieldType::Number
            | FieldType::Time
            | FieldType::Year
            | FieldType::Yearmonth => ORDERED,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(Cell::String(s.to_string()))
            .map_err(|_| format!("type \"{s}\" is not supported"))
    }
}

/// Casts a raw cell according to the field's type, format and options.
///
/// `cell` is never a missing value here: missing values are handled by the
/// caller before casting.
pub(crate) fn read_value(field: &Field, cell: &Cell) -> Option<Value> {
    match field.field_type {
        FieldType::Any => Some(Value::Any(cell.clone())),
        FieldType::Array => structured::read_array(field, cell),
        FieldType::Boolean => boolean::read_boolean(field, cell),
        FieldType::Date => temporal::read_date(field, cell),
        FieldType::Datetime => temporal::read_datetime(field, cell),
        FieldType::Duration => temporal::read_duration(cell),
        FieldType::Geojson => geo::read_geojson(field, cell),
        FieldType::Geopoint => geo::read_geopoint(field, cell),
        FieldType::Integer => numeric::read_integer(field, cell),
        FieldType::Number => numeric::read_number(field, cell),
        FieldType::Object => structured::read_object(cell),
        FieldType::String => text::read_string(field, cell),
        FieldType::Time => temporal::read_time(field, cell),
        FieldType::Year => temporal::read_year(cell),
        FieldType::Yearmonth => temporal::read_yearmonth(cell),
    }
}

/// Serializes a typed value according to the field's format and options.
///
/// Returns `None` when the value does not belong to the field's type.
pub(crate) fn write_value(field: &Field, value: &Value) -> Option<String> {
    match (field.field_type, value) {
        (FieldType::Any, value) => Some(value.to_string()),
        (FieldType::Array, Value::Array(_)) | (FieldType::Object, Value::Object(_)) => {
            Some(value.to_string())
        }
        (FieldType::Boolean, Value::Boolean(value)) => Some(boolean::write_boolean(field, *value)),
        (FieldType::Date, Value::Date(_))
        | (FieldType::Datetime, Value::DateTime(_) | Value::DateTimeTz(_))
        | (FieldType::Time, Value::Time(_)) => temporal::write_temporal(field, value),
        (FieldType::Duration, Value::Duration(_))
        | (FieldType::Year, Value::Year(_))
        | (FieldType::Yearmonth, Value::YearMonth(_))
        | (FieldType::Geojson, Value::GeoJson(_))
        | (FieldType::String, Value::String(_))
        | (FieldType::Integer, Value::Integer(_)) => Some(value.to_string()),
        (FieldType::Geopoint, Value::GeoPoint(point)) => Some(geo::write_geopoint(field, point)),
        (FieldType::Number, Value::Number(_) | Value::Float(_) | Value::Integer(_)) => {
            Some(numeric::write_number(field, value))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_type_from_str() {
        assert_eq!("yearmonth".parse::<FieldType>(), Ok(FieldType::Yearmonth));
        assert_eq!(
            "bad".parse::<FieldType>(),
            Err("type \"bad\" is not supported".to_string())
        );
    }

    #[test]
    fn test_inference_order_ends_with_string() {
        assert_eq!(FieldType::INFERENCE_ORDER.last(), Some(&FieldType::String));
        assert!(!FieldType::INFERENCE_ORDER.contains(&FieldType::Any));
    }

    #[test]
    fn test_supported_constraints() {
        assert!(FieldType::String.supported_constraints().contains(&"pattern"));
        assert!(!FieldType::Integer.supported_constraints().contains(&"pattern"));
        assert!(FieldType::Number.supported_constraints().contains(&"minimum"));
    }
}
