use crate::{Cell, Field, IsoDuration, Value, YearMonth};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt::Write;
use std::str::FromStr;

const ANY_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%Y%m%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

const ANY_TIME_FORMATS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
    "%H%M%S",
];

const ANY_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Format of a temporal field after resolving the legacy `fmt:` prefix.
enum Layout<'a> {
    Default,
    Any,
    Pattern(&'a str),
}

fn layout(field: &Field) -> Layout<'_> {
    match field.format() {
        "default" => Layout::Default,
        "any" => Layout::Any,
        pattern => Layout::Pattern(pattern.strip_prefix("fmt:").unwrap_or(pattern)),
    }
}

/// Whether a strftime pattern only contains known specifiers.
pub(crate) fn is_valid_pattern(pattern: &str) -> bool {
    let pattern = pattern.strip_prefix("fmt:").unwrap_or(pattern);
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

pub(super) fn read_date(field: &Field, cell: &Cell) -> Option<Value> {
    let text = cell.as_str()?.trim();
    let date = match layout(field) {
        Layout::Default => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
        Layout::Any => ANY_DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
            .or_else(|| any_datetime(text).map(|value| value.date())),
        Layout::Pattern(pattern) => NaiveDate::parse_from_str(text, pattern).ok(),
    };
    date.map(Value::Date)
}

pub(super) fn read_time(field: &Field, cell: &Cell) -> Option<Value> {
    let text = cell.as_str()?.trim();
    let time = match layout(field) {
        Layout::Default => {
            let text = text.strip_suffix('Z').unwrap_or(text);
            NaiveTime::parse_from_str(text, "%H:%M:%S%.f").ok()
        }
        Layout::Any => ANY_TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(text, format).ok()),
        Layout::Pattern(pattern) => NaiveTime::parse_from_str(text, pattern).ok(),
    };
    time.map(Value::Time)
}

pub(super) fn read_datetime(field: &Field, cell: &Cell) -> Option<Value> {
    let text = cell.as_str()?.trim();
    match layout(field) {
        Layout::Default => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(Value::DateTimeTz)
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(Value::DateTime)
            }),
        Layout::Any => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(Value::DateTimeTz)
            .or_else(|| any_datetime(text).map(Value::DateTime)),
        Layout::Pattern(pattern) if pattern.contains("%z") || pattern.contains("%:z") => {
            DateTime::parse_from_str(text, pattern)
                .ok()
                .map(Value::DateTimeTz)
        }
        Layout::Pattern(pattern) => NaiveDateTime::parse_from_str(text, pattern)
            .ok()
            .map(Value::DateTime),
    }
}

fn any_datetime(text: &str) -> Option<NaiveDateTime> {
    ANY_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            ANY_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

pub(super) fn write_temporal(field: &Field, value: &Value) -> Option<String> {
    let Layout::Pattern(pattern) = layout(field) else {
        return Some(value.to_string());
    };
    let mut output = String::new();
    let written = match value {
        Value::Date(date) => write!(output, "{}", date.format(pattern)),
        Value::DateTime(datetime) => write!(output, "{}", datetime.format(pattern)),
        Value::DateTimeTz(datetime) => write!(output, "{}", datetime.format(pattern)),
        Value::Time(time) => write!(output, "{}", time.format(pattern)),
        _ => return None,
    };
    written.ok().map(|_| output)
}

pub(super) fn read_year(cell: &Cell) -> Option<Value> {
    let year = match cell {
        Cell::Number(number) => i32::try_from(number.as_i64()?).ok()?,
        Cell::String(text) => {
            if text.len() != 4 || !text.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            text.parse().ok()?
        }
        _ => return None,
    };
    (0..=9999).contains(&year).then_some(Value::Year(year))
}

pub(super) fn read_yearmonth(cell: &Cell) -> Option<Value> {
    let (year, month) = match cell {
        Cell::Array(items) if items.len() == 2 => (
            i32::try_from(items[0].as_i64()?).ok()?,
            u32::try_from(items[1].as_i64()?).ok()?,
        ),
        Cell::String(text) => {
            let (year, month) = text.trim().split_once('-')?;
            if year.len() != 4 || month.is_empty() || month.len() > 2 {
                return None;
            }
            (year.parse().ok()?, month.parse().ok()?)
        }
        _ => return None,
    };
    YearMonth::new(year, month).map(Value::YearMonth)
}

pub(super) fn read_duration(cell: &Cell) -> Option<Value> {
    parse_duration(cell.as_str()?.trim()).map(Value::Duration)
}

/// Splits `1Y2M3D` into `[("1", 'Y'), ("2", 'M'), ("3", 'D')]`.
fn components(text: &str) -> Option<Vec<(&str, char)>> {
    let mut output = Vec::new();
    let mut start = 0;
    for (index, unit) in text.char_indices() {
        if unit.is_ascii_alphabetic() {
            let amount = &text[start..index];
            if amount.is_empty() || !amount.chars().all(|c| c.is_ascii_digit() || c == '.') {
                return None;
            }
            output.push((amount, unit));
            start = index + 1;
        }
    }
    (start == text.len()).then_some(output)
}

fn parse_duration(text: &str) -> Option<IsoDuration> {
    let rest = text.strip_prefix('P')?;
    let (date, time) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };
    if rest.is_empty() || time == Some("") {
        return None;
    }

    let mut duration = IsoDuration::default();
    let mut last = 0;
    for (amount, unit) in components(date)? {
        let position = "YMWD".find(unit)? + 1;
        if position <= last {
            return None;
        }
        last = position;
        let amount: u64 = amount.parse().ok()?;
        match unit {
            'Y' => duration.years = amount,
            'M' => duration.months = amount,
            'W' => duration.weeks = amount,
            _ => duration.days = amount,
        }
    }

    let mut last = 0;
    for (amount, unit) in components(time.unwrap_or(""))? {
        let position = "HMS".find(unit)? + 1;
        if position <= last {
            return None;
        }
        last = position;
        match unit {
            'H' => duration.hours = amount.parse().ok()?,
            'M' => duration.minutes = amount.parse().ok()?,
            _ => duration.seconds = Decimal::from_str(amount).ok()?,
        }
    }
    Some(duration)
}
