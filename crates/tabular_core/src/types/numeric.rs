use crate::{Cell, Field, Value};
use rust_decimal::Decimal;
use serde_json::Number;
use std::str::FromStr;

/// Parses an exact decimal, accepting scientific notation.
fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Strips leading currency/percent symbols and trailing units around a number.
fn strip_symbols<'a>(text: &'a str, decimal_char: &str) -> &'a str {
    text.trim_start_matches(|c: char| {
        !(c.is_ascii_digit() || c == '-' || c == '+' || decimal_char.contains(c))
    })
    .trim_end_matches(|c: char| !c.is_ascii_digit())
}

pub(super) fn read_integer(field: &Field, cell: &Cell) -> Option<Value> {
    match cell {
        Cell::Number(number) => integer_from_json(number),
        Cell::String(text) => {
            let mut text = text.trim();
            if !field.bare_number() {
                text = strip_symbols(text, "");
            }
            text.parse::<i64>().ok().map(Value::Integer)
        }
        _ => None,
    }
}

fn integer_from_json(number: &Number) -> Option<Value> {
    if let Some(value) = number.as_i64() {
        return Some(Value::Integer(value));
    }
    let value = number.as_f64()?;
    (value.fract() == 0.0 && value.abs() < i64::MAX as f64).then_some(Value::Integer(value as i64))
}

pub(super) fn read_number(field: &Field, cell: &Cell) -> Option<Value> {
    let text = match cell {
        Cell::Number(number) => number.to_string(),
        Cell::String(text) => normalize_number(field, text)?,
        _ => return None,
    };
    if field.float_number() {
        return text.parse::<f64>().ok().map(Value::Float);
    }
    parse_decimal(&text).map(Value::Number)
}

/// Applies bare-number stripping and the group/decimal characters so the
/// result uses `.` as its only separator.
fn normalize_number(field: &Field, text: &str) -> Option<String> {
    let decimal_char = field.decimal_char();
    let mut text = text.trim();
    if !field.bare_number() {
        text = strip_symbols(text, decimal_char);
    }
    let mut text = text.to_string();
    let group_char = field.group_char();
    if !group_char.is_empty() {
        text = text.replace(group_char, "");
    }
    if decimal_char != "." {
        if text.contains('.') {
            return None;
        }
        text = text.replace(decimal_char, ".");
    }
    Some(text)
}

pub(super) fn write_number(field: &Field, value: &Value) -> String {
    let text = value.to_string();
    let group_char = field.group_char();
    let decimal_char = field.decimal_char();
    if group_char.is_empty() && decimal_char == "." {
        return text;
    }

    let (sign, digits) = match text.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", text.as_str()),
    };
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits, None),
    };

    let mut output = String::from(sign);
    let length = integer.len();
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (length - index) % 3 == 0 {
            output.push_str(group_char);
        }
        output.push(digit);
    }
    if let Some(fraction) = fraction {
        output.push_str(decimal_char);
        output.push_str(fraction);
    }
    output
}
