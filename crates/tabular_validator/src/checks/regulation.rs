use super::{Check, cell_error, require_field};
use crate::resource::OpenTable;
use crate::row::Row;
use crate::{ErrorCode, Result, TableError};
use tabular_core::{Cell, Value, stringify_cell};

/// Flags cells of a field holding one of the forbidden values.
#[derive(Debug)]
pub struct ForbiddenValue {
    field_name: String,
    values: Vec<Cell>,
    keys: Vec<String>,
    position: usize,
}

impl ForbiddenValue {
    pub fn new(field_name: impl Into<String>, values: Vec<Cell>) -> Self {
        let keys = values.iter().map(stringify_cell).collect();
        Self {
            field_name: field_name.into(),
            values,
            keys,
            position: 0,
        }
    }
}

impl Check for ForbiddenValue {
    fn code(&self) -> &'static str {
        "forbidden-value"
    }

    fn emits(&self) -> &'static [ErrorCode] {
        &[ErrorCode::ForbiddenValue]
    }

    fn start(&mut self, table: &OpenTable) -> Result<Vec<TableError>> {
        self.position = require_field(table, "forbidden value", &self.field_name, None)?;
        Ok(Vec::new())
    }

    fn validate_row(&mut self, row: &Row) -> Vec<TableError> {
        let Some(Some(value)) = row.values().get(self.position) else {
            return Vec::new();
        };
        if !self.keys.contains(&value.key()) {
            return Vec::new();
        }
        let forbidden: Vec<String> = self.values.iter().map(stringify_cell).collect();
        let note = format!("forbidden values are \"{}\"", forbidden.join(", "));
        vec![cell_error(ErrorCode::ForbiddenValue, note, row, self.position)]
    }
}

/// Requires an integer field to count up by one from its first value.
/// Reported once, at the first break.
#[derive(Debug)]
pub struct SequentialValue {
    field_name: String,
    position: usize,
    cursor: Option<i64>,
    broken: bool,
}

impl SequentialValue {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            position: 0,
            cursor: None,
            broken: false,
        }
    }
}

impl Check for SequentialValue {
    fn code(&self) -> &'static str {
        "sequential-value"
    }

    fn emits(&self) -> &'static [ErrorCode] {
        &[ErrorCode::SequentialValue]
    }

    fn start(&mut self, table: &OpenTable) -> Result<Vec<TableError>> {
        self.position = require_field(table, "sequential value", &self.field_name, None)?;
        Ok(Vec::new())
    }

    fn validate_row(&mut self, row: &Row) -> Vec<TableError> {
        if self.broken {
            return Vec::new();
        }
        let next = match row.values().get(self.position) {
            Some(Some(Value::Integer(number))) => Some(*number),
            _ => None,
        };
        let sequential = match (next, self.cursor) {
            (Some(number), None) => {
                self.cursor = Some(number);
                true
            }
            (Some(number), Some(expected)) => number == expected,
            (None, _) => false,
        };
        if sequential {
            self.cursor = self.cursor.map(|cursor| cursor + 1);
            return Vec::new();
        }
        self.broken = true;
        vec![cell_error(
            ErrorCode::SequentialValue,
            "the value is not sequential",
            row,
            self.position,
        )]
    }
}

/// Bounds on the table's field and row counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDimensions {
    pub num_rows: Option<usize>,
    pub min_rows: Option<usize>,
    pub max_rows: Option<usize>,
    pub num_fields: Option<usize>,
    pub min_fields: Option<usize>,
    pub max_fields: Option<usize>,
}

fn dimension_error(note: String) -> TableError {
    TableError::general(ErrorCode::TableDimensions, note)
}

impl Check for TableDimensions {
    fn code(&self) -> &'static str {
        "table-dimensions"
    }

    fn emits(&self) -> &'static [ErrorCode] {
        &[ErrorCode::TableDimensions]
    }

    fn start(&mut self, table: &OpenTable) -> Result<Vec<TableError>> {
        let fields = table.schema().fields.len();
        let mut errors = Vec::new();
        if let Some(required) = self.num_fields
            && fields != required
        {
            errors.push(dimension_error(format!(
                "Current number of fields is {fields}, the required number is {required}"
            )));
        }
        if let Some(minimum) = self.min_fields
            && fields < minimum
        {
            errors.push(dimension_error(format!(
                "Current number of fields is {fields}, the minimum is {minimum}"
            )));
        }
        if let Some(maximum) = self.max_fields
            && fields > maximum
        {
            errors.push(dimension_error(format!(
                "Current number of fields is {fields}, the maximum is {maximum}"
            )));
        }
        Ok(errors)
    }

    fn validate_end(&mut self, table: &OpenTable) -> Vec<TableError> {
        let rows = table.row_count();
        let mut errors = Vec::new();
        if let Some(required) = self.num_rows
            && rows != required
        {
            errors.push(dimension_error(format!(
                "Current number of rows is {rows}, the required is {required}"
            )));
        }
        if let Some(minimum) = self.min_rows
            && rows < minimum
        {
            errors.push(dimension_error(format!(
                "Current number of rows is {rows}, the minimum is {minimum}"
            )));
        }
        if let Some(maximum) = self.max_rows
            && rows > maximum
        {
            errors.push(dimension_error(format!(
                "Current number of rows is {rows}, the maximum is {maximum}"
            )));
        }
        errors
    }
}

/// Flags text cells with non-ASCII characters.
#[derive(Debug, Default)]
pub struct AsciiValue;

impl Check for AsciiValue {
    fn code(&self) -> &'static str {
        "ascii-value"
    }

    fn emits(&self) -> &'static [ErrorCode] {
        &[ErrorCode::AsciiValue]
    }

    fn validate_row(&mut self, row: &Row) -> Vec<TableError> {
        row.values()
            .iter()
            .enumerate()
            .filter(|(_, value)| matches!(value, Some(Value::String(text)) if !text.is_ascii()))
            .map(|(index, _)| {
                cell_error(
                    ErrorCode::AsciiValue,
                    "the cell contains non-ascii characters",
                    row,
                    index,
                )
            })
            .collect()
    }
}
