//! Raw cells and typed values.
//!
//! A [`Cell`] is what a parser yields: a string for text formats, or an
//! already typed JSON scalar/structure for structured formats. A [`Value`] is
//! what a [`Field`](crate::Field) casts a cell to.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::{Map, Number};
use std::cmp::Ordering;
use std::fmt;

/// Raw cell as produced by a parser. `Null` stands for an absent cell.
pub type Cell = serde_json::Value;

/// Typed cell value produced by a successful cast.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Uncast cell of an `any` field
    Any(Cell),
    /// JSON array of an `array` field
    Array(Vec<Cell>),
    Boolean(bool),
    Date(NaiveDate),
    /// Datetime without an offset
    DateTime(NaiveDateTime),
    /// Datetime carrying an explicit offset
    DateTimeTz(DateTime<FixedOffset>),
    Duration(IsoDuration),
    GeoJson(Map<String, Cell>),
    GeoPoint(GeoPoint),
    Integer(i64),
    /// Exact decimal number
    Number(Decimal),
    /// Number read in float mode
    Float(f64),
    Object(Map<String, Cell>),
    String(String),
    Time(NaiveTime),
    Year(i32),
    YearMonth(YearMonth),
}

impl Value {
    /// Canonical key used by uniqueness and key lookups.
    ///
    /// Numerically equal decimals share a key (`1.0` and `1.00`).
    pub fn key(&self) -> String {
        match self {
            Value::Number(number) => number.normalize().to_string(),
            Value::Float(number) if number.fract() == 0.0 && number.is_finite() => {
                format!("{}", *number as i128)
            }
            other => other.to_string(),
        }
    }

    /// JSON representation of the value (numbers stay numbers).
    pub fn to_json(&self) -> Cell {
        match self {
            Value::Any(cell) => cell.clone(),
            Value::Array(items) => Cell::Array(items.clone()),
            Value::Boolean(value) => Cell::Bool(*value),
            Value::Integer(value) => Cell::from(*value),
            Value::Year(value) => Cell::from(*value),
            Value::Number(value) => value
                .to_string()
                .parse::<Number>()
                .map(Cell::Number)
                .unwrap_or_else(|_| Cell::String(value.to_string())),
            Value::Float(value) => Number::from_f64(*value)
                .map(Cell::Number)
                .unwrap_or_else(|| Cell::String(value.to_string())),
            Value::GeoJson(map) | Value::Object(map) => Cell::Object(map.clone()),
            other => Cell::String(other.to_string()),
        }
    }

    /// Numeric view used by statistical checks.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Year(value) => Some(f64::from(*value)),
            Value::Number(value) => value.to_string().parse().ok(),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Length as seen by `minLength`/`maxLength`.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(text) => Some(text.chars().count()),
            Value::Array(items) => Some(items.len()),
            Value::Object(map) | Value::GeoJson(map) => Some(map.len()),
            _ => None,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Number(b)) => Decimal::from(*a).partial_cmp(b),
            (Value::Number(a), Value::Integer(b)) => a.partial_cmp(&Decimal::from(*b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.partial_cmp(b),
            (Value::DateTimeTz(a), Value::DateTimeTz(b)) => a.partial_cmp(b),
            (Value::Time(a), Value::Time(b)) => a.partial_cmp(b),
            (Value::Year(a), Value::Year(b)) => a.partial_cmp(b),
            (Value::YearMonth(a), Value::YearMonth(b)) => a.partial_cmp(b),
            (Value::Duration(a), Value::Duration(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Any(Cell::String(text)) | Value::String(text) => f.write_str(text),
            Value::Any(cell) => write!(f, "{cell}"),
            Value::Array(items) => write!(f, "{}", Cell::Array(items.clone())),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Value::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::DateTimeTz(value) => {
                if value.offset().local_minus_utc() == 0 {
                    write!(f, "{}Z", value.format("%Y-%m-%dT%H:%M:%S%.f"))
                } else {
                    write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S%.f%:z"))
                }
            }
            Value::Duration(value) => write!(f, "{value}"),
            Value::GeoJson(map) | Value::Object(map) => {
                write!(f, "{}", Cell::Object(map.clone()))
            }
            Value::GeoPoint(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Time(value) => write!(f, "{}", value.format("%H:%M:%S%.f")),
            Value::Year(value) => write!(f, "{value:04}"),
            Value::YearMonth(value) => write!(f, "{value}"),
        }
    }
}

/// Longitude/latitude pair of a `geopoint` field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting coordinates outside the valid ranges.
    pub fn new(lon: f64, lat: f64) -> Option<Self> {
        if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        Some(Self { lon, lat })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lon, self.lat)
    }
}

/// Year and month of a `yearmonth` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Creates a year-month, rejecting months outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// ISO 8601 duration (`P1Y2M10DT2H30M`).
///
/// Components are kept as written so that serialization reproduces the
/// canonical form instead of a normalized number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IsoDuration {
    pub years: u64,
    pub months: u64,
    pub weeks: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: Decimal,
}

impl IsoDuration {
    /// Approximate length in seconds (30-day months, 365-day years).
    pub fn approximate_seconds(&self) -> Decimal {
        let whole = self.years * 365 * 86_400
            + self.months * 30 * 86_400
            + self.weeks * 7 * 86_400
            + self.days * 86_400
            + self.hours * 3_600
            + self.minutes * 60;
        Decimal::from(whole) + self.seconds
    }
}

impl PartialOrd for IsoDuration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.approximate_seconds()
            .partial_cmp(&other.approximate_seconds())
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("P")?;
        for (amount, unit) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if amount > 0 {
                write!(f, "{amount}{unit}")?;
            }
        }
        let has_time = self.hours > 0 || self.minutes > 0 || !self.seconds.is_zero();
        if has_time {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if !self.seconds.is_zero() {
                write!(f, "{}S", self.seconds)?;
            }
        } else if *self == Self::default() {
            f.write_str("T0S")?;
        }
        Ok(())
    }
}

/// Renders a raw cell the way it appears in labels and report cells.
pub fn stringify_cell(cell: &Cell) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_number_key_ignores_scale() {
        let a = Value::Number(Decimal::from_str("1.0").unwrap());
        let b = Value::Number(Decimal::from_str("1.00").unwrap());
        assert_eq!(a.key(), b.key());
        assert_eq!(a, b);
    }

    #[test]
    fn test_mixed_numeric_ordering() {
        let int = Value::Integer(5);
        let dec = Value::Number(Decimal::from_str("4.5").unwrap());
        assert_eq!(int.partial_cmp(&dec), Some(Ordering::Greater));
        assert_eq!(int.partial_cmp(&Value::String("5".into())), None);
    }

    #[test]
    fn test_to_json_keeps_numbers() {
        assert_eq!(Value::Integer(3).to_json(), json!(3));
        assert_eq!(Value::Boolean(true).to_json(), json!(true));
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap()).to_json(),
            json!("2020-01-31")
        );
    }

    #[test]
    fn test_duration_display() {
        let duration = IsoDuration {
            years: 1,
            days: 3,
            minutes: 30,
            ..Default::default()
        };
        assert_eq!(duration.to_string(), "P1Y3DT30M");
        assert_eq!(IsoDuration::default().to_string(), "PT0S");
    }

    #[test]
    fn test_geopoint_ranges() {
        assert!(GeoPoint::new(180.0, 90.0).is_some());
        assert!(GeoPoint::new(181.0, 0.0).is_none());
        assert!(GeoPoint::new(0.0, -91.0).is_none());
    }

    #[test]
    fn test_stringify_cell() {
        assert_eq!(stringify_cell(&json!(null)), "");
        assert_eq!(stringify_cell(&json!("a")), "a");
        assert_eq!(stringify_cell(&json!(1.5)), "1.5");
    }
}
