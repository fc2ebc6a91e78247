use super::{Check, cell_error, require_field};
use crate::resource::OpenTable;
use crate::row::Row;
use crate::{ErrorCode, Result, TableError};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tabular_core::{FieldType, Value};

/// Flags rows whose values repeat an earlier row.
#[derive(Debug, Default)]
pub struct DuplicateRow {
    seen: HashMap<[u8; 32], usize>,
}

impl DuplicateRow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Check for DuplicateRow {
    fn code(&self) -> &'static str {
        "duplicate-row"
    }

    fn emits(&self) -> &'static [ErrorCode] {
        &[ErrorCode::DuplicateRow]
    }

    fn validate_row(&mut self, row: &Row) -> Vec<TableError> {
        // blank rows are already reported as such
        if row.is_blank() {
            return Vec::new();
        }
        let mut hasher = Sha256::new();
        for value in row.values() {
            hasher.update(value.as_ref().map(Value::key).unwrap_or_default());
            hasher.update([0x1f]);
        }
        let digest: [u8; 32] = hasher.finalize().into();

        match self.seen.get(&digest) {
            Some(first) => vec![TableError::row(
                ErrorCode::DuplicateRow,
                format!("the same as row at position \"{first}\""),
                row.cell_strings(),
                row.row_number(),
            )],
            None => {
                self.seen.insert(digest, row.row_number());
                Vec::new()
            }
        }
    }
}

const AVERAGES: &[&str] = &["mean", "median", "mode"];

/// Flags numeric values outside `average ± interval · stdev`.
#[derive(Debug)]
pub struct DeviatedValue {
    field_name: String,
    interval: f64,
    average: String,
    position: usize,
    values: Vec<(usize, Value)>,
}

impl DeviatedValue {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            interval: 3.0,
            average: "mean".to_string(),
            position: 0,
            values: Vec::new(),
        }
    }

    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_average(mut self, average: impl Into<String>) -> Self {
        self.average = average.into();
        self
    }

    fn average_of(&self, numbers: &[f64]) -> f64 {
        match self.average.as_str() {
            "median" => {
                let mut sorted = numbers.to_vec();
                sorted.sort_by(f64::total_cmp);
                let middle = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[middle - 1] + sorted[middle]) / 2.0
                } else {
                    sorted[middle]
                }
            }
            "mode" => {
                // first encountered among the most common
                let mut counts: Vec<(f64, usize)> = Vec::new();
                for number in numbers {
                    match counts.iter_mut().find(|(seen, _)| seen == number) {
                        Some((_, count)) => *count += 1,
                        None => counts.push((*number, 1)),
                    }
                }
                let best = counts.iter().map(|(_, count)| *count).max().unwrap_or_default();
                counts
                    .iter()
                    .find(|(_, count)| *count == best)
                    .map(|(number, _)| *number)
                    .unwrap_or_default()
            }
            _ => numbers.iter().sum::<f64>() / numbers.len() as f64,
        }
    }
}

fn sample_stdev(numbers: &[f64]) -> f64 {
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
    let variance = numbers.iter().map(|number| (number - mean).powi(2)).sum::<f64>()
        / (numbers.len() - 1) as f64;
    variance.sqrt()
}

impl Check for DeviatedValue {
    fn code(&self) -> &'static str {
        "deviated-value"
    }

    fn emits(&self) -> &'static [ErrorCode] {
        &[ErrorCode::DeviatedValue]
    }

    fn start(&mut self, table: &OpenTable) -> Result<Vec<TableError>> {
        self.position = require_field(
            table,
            "deviated value",
            &self.field_name,
            Some(&[FieldType::Integer, FieldType::Number]),
        )?;
        if !AVERAGES.contains(&self.average.as_str()) {
            return Err(TableError::check(format!(
                "deviated value check supports only average functions \"{}\"",
                AVERAGES.join(", ")
            )));
        }
        Ok(Vec::new())
    }

    fn validate_row(&mut self, row: &Row) -> Vec<TableError> {
        if let Some(Some(value)) = row.values().get(self.position)
            && value.as_f64().is_some()
        {
            self.values.push((row.row_number(), value.clone()));
        }
        Vec::new()
    }

    fn validate_end(&mut self, _table: &OpenTable) -> Vec<TableError> {
        if self.values.len() < 2 {
            return Vec::new();
        }
        let numbers: Vec<f64> = self
            .values
            .iter()
            .filter_map(|(_, value)| value.as_f64())
            .collect();
        let average = self.average_of(&numbers);
        let stdev = sample_stdev(&numbers);
        let minimum = average - stdev * self.interval;
        let maximum = average + stdev * self.interval;

        self.values
            .iter()
            .zip(&numbers)
            .filter(|(_, number)| **number < minimum || **number > maximum)
            .map(|((row_number, value), _)| {
                TableError::general(
                    ErrorCode::DeviatedValue,
                    format!(
                        "value \"{value}\" in row at position \"{row_number}\" and field \"{}\" is deviated \"[{minimum:.2}, {maximum:.2}]\"",
                        self.field_name
                    ),
                )
            })
            .collect()
    }
}

const TRUNCATED_STRING_LENGTHS: &[usize] = &[255];
const TRUNCATED_INTEGERS: &[i64] = &[
    9223372036854775807,
    4294967295,
    2147483647,
    2097152,
    65535,
    32767,
];

/// Flags values sitting exactly at common storage limits.
#[derive(Debug, Default)]
pub struct TruncatedValue;

impl Check for TruncatedValue {
    fn code(&self) -> &'static str {
        "truncated-value"
    }

    fn emits(&self) -> &'static [ErrorCode] {
        &[ErrorCode::TruncatedValue]
    }

    fn validate_row(&mut self, row: &Row) -> Vec<TableError> {
        row.values()
            .iter()
            .enumerate()
            .filter(|(_, value)| match value {
                Some(Value::String(text)) => {
                    TRUNCATED_STRING_LENGTHS.contains(&text.chars().count())
                }
                Some(Value::Integer(number)) => TRUNCATED_INTEGERS.contains(number),
                _ => false,
            })
            .map(|(index, _)| {
                cell_error(ErrorCode::TruncatedValue, "value is probably truncated", row, index)
            })
            .collect()
    }
}
