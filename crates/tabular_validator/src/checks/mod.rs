//! Pluggable checks run over the row stream.
//!
//! Every check has three hooks: `start` once the table is open, `validate_row`
//! for each row, and `validate_end` after the last row of a complete read.
//! A check that cannot start is removed and reported as `check-error`.
//!
//! Checks are declared with [`CheckDescriptor`], which is also the closed
//! registry of check types:
//!
//! ```rust
//! use tabular_validator::CheckDescriptor;
//! use serde_json::json;
//!
//! let check: CheckDescriptor = serde_json::from_value(json!({
//!     "type": "deviated-value",
//!     "fieldName": "price",
//!     "interval": 2
//! }))
//! .unwrap();
//! assert_eq!(check.build().code(), "deviated-value");
//! ```

mod baseline;
mod heuristic;
mod regulation;

pub use baseline::{Baseline, ExpectedTable, parse_hash};
pub use heuristic::{DeviatedValue, DuplicateRow, TruncatedValue};
pub use regulation::{AsciiValue, ForbiddenValue, SequentialValue, TableDimensions};

use crate::resource::OpenTable;
use crate::row::Row;
use crate::{ErrorCode, Result, TableError};
use serde::{Deserialize, Serialize};
use tabular_core::{Cell, FieldType};

/// A validation check.
pub trait Check: Send {
    fn code(&self) -> &'static str;

    /// Error codes this check can produce.
    fn emits(&self) -> &'static [ErrorCode];

    /// Called once the table is open. An `Err` removes the check.
    fn start(&mut self, _table: &OpenTable) -> Result<Vec<TableError>> {
        Ok(Vec::new())
    }

    fn validate_row(&mut self, _row: &Row) -> Vec<TableError> {
        Vec::new()
    }

    /// Called after the last row; skipped when the read was cut short.
    fn validate_end(&mut self, _table: &OpenTable) -> Vec<TableError> {
        Vec::new()
    }
}

/// Serializable declaration of a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum CheckDescriptor {
    DuplicateRow,
    DeviatedValue {
        field_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interval: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        average: Option<String>,
    },
    TruncatedValue,
    ForbiddenValue {
        field_name: String,
        values: Vec<Cell>,
    },
    SequentialValue {
        field_name: String,
    },
    TableDimensions {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        num_rows: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_rows: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_rows: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        num_fields: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_fields: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_fields: Option<usize>,
    },
    AsciiValue,
}

impl CheckDescriptor {
    pub fn build(&self) -> Box<dyn Check> {
        match self {
            CheckDescriptor::DuplicateRow => Box::new(DuplicateRow::new()),
            CheckDescriptor::DeviatedValue {
                field_name,
                interval,
                average,
            } => {
                let mut check = DeviatedValue::new(field_name);
                if let Some(interval) = interval {
                    check = check.with_interval(*interval);
                }
                if let Some(average) = average {
                    check = check.with_average(average);
                }
                Box::new(check)
            }
            CheckDescriptor::TruncatedValue => Box::new(TruncatedValue),
            CheckDescriptor::ForbiddenValue { field_name, values } => {
                Box::new(ForbiddenValue::new(field_name, values.clone()))
            }
            CheckDescriptor::SequentialValue { field_name } => {
                Box::new(SequentialValue::new(field_name))
            }
            CheckDescriptor::TableDimensions {
                num_rows,
                min_rows,
                max_rows,
                num_fields,
                min_fields,
                max_fields,
            } => Box::new(TableDimensions {
                num_rows: *num_rows,
                min_rows: *min_rows,
                max_rows: *max_rows,
                num_fields: *num_fields,
                min_fields: *min_fields,
                max_fields: *max_fields,
            }),
            CheckDescriptor::AsciiValue => Box::new(AsciiValue),
        }
    }
}

/// Position of a field that a check requires, optionally of given types.
pub(crate) fn require_field(
    table: &OpenTable,
    check: &str,
    field_name: &str,
    types: Option<&[FieldType]>,
) -> Result<usize> {
    let Some(position) = table.schema().field_position(field_name) else {
        return Err(TableError::check(format!(
            "{check} check requires field \"{field_name}\" to exist"
        )));
    };
    if let Some(types) = types
        && !types.contains(&table.schema().fields[position].field_type)
    {
        return Err(TableError::check(format!(
            "{check} check requires field \"{field_name}\" to be numeric"
        )));
    }
    Ok(position)
}

/// A cell error for field `index` of `row`.
pub(crate) fn cell_error(code: ErrorCode, note: impl Into<String>, row: &Row, index: usize) -> TableError {
    TableError::cell(
        code,
        note,
        row.cell_strings(),
        row.row_number(),
        row.cells().get(index).map(tabular_core::stringify_cell).unwrap_or_default(),
        row.field_names().get(index).cloned().unwrap_or_default(),
        index + 1,
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::TableResource;

    /// Runs a check over inline rows the way the validator does.
    pub fn run(check: &mut dyn Check, data: Vec<Cell>) -> Result<Vec<TableError>> {
        let mut table = TableResource::from_data(data).open()?;
        let mut errors = check.start(&table)?;
        let rows: Vec<Row> = table.rows().collect::<Result<_>>()?;
        for row in &rows {
            errors.extend(check.validate_row(row));
        }
        errors.extend(check.validate_end(&table));
        Ok(errors)
    }
}
