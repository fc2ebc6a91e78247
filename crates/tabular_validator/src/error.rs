//! Error taxonomy of validation reports.
//!
//! Every problem found while reading or validating a table is a
//! [`TableError`]: a stable [`ErrorCode`] with tags, a human readable note
//! and the position it refers to (the table, the header, a label, a row or a
//! cell).

use serde::{Serialize, Serializer};
use serde_json::{Map, json};
use std::fmt;
use std::io;
use std::str::FromStr;
use tabular_core::{Cell, CoreError};
use thiserror::Error;

/// Result type alias for reading and validation operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Stable identifier of an error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    // Source and metadata errors; fatal for a task
    SchemeError,
    FormatError,
    EncodingError,
    CompressionError,
    HashingError,
    DialectError,
    SchemaError,
    ResourceError,
    PackageError,
    CheckError,
    TaskError,
    SourceError,

    // Expected statistics
    HashCount,
    ByteCount,
    FieldCount,
    RowCount,

    // Header
    BlankHeader,
    BlankLabel,
    DuplicateLabel,
    ExtraLabel,
    MissingLabel,
    IncorrectLabel,

    // Rows
    BlankRow,
    PrimaryKeyError,
    ForeignKeyError,
    DuplicateRow,

    // Cells
    ExtraCell,
    MissingCell,
    TypeError,
    ConstraintError,
    UniqueError,
    TruncatedValue,
    ForbiddenValue,
    SequentialValue,
    AsciiValue,

    // Table level checks
    DeviatedValue,
    TableDimensions,
}

impl ErrorCode {
    /// Every code, in catalog order.
    pub const ALL: [ErrorCode; 37] = [
        ErrorCode::SchemeError,
        ErrorCode::FormatError,
        ErrorCode::EncodingError,
        ErrorCode::CompressionError,
        ErrorCode::HashingError,
        ErrorCode::DialectError,
        ErrorCode::SchemaError,
        ErrorCode::ResourceError,
        ErrorCode::PackageError,
        ErrorCode::CheckError,
        ErrorCode::TaskError,
        ErrorCode::SourceError,
        ErrorCode::HashCount,
        ErrorCode::ByteCount,
        ErrorCode::FieldCount,
        ErrorCode::RowCount,
        ErrorCode::BlankHeader,
        ErrorCode::BlankLabel,
        ErrorCode::DuplicateLabel,
        ErrorCode::ExtraLabel,
        ErrorCode::MissingLabel,
        ErrorCode::IncorrectLabel,
        ErrorCode::BlankRow,
        ErrorCode::PrimaryKeyError,
        ErrorCode::ForeignKeyError,
        ErrorCode::DuplicateRow,
        ErrorCode::ExtraCell,
        ErrorCode::MissingCell,
        ErrorCode::TypeError,
        ErrorCode::ConstraintError,
        ErrorCode::UniqueError,
        ErrorCode::TruncatedValue,
        ErrorCode::ForbiddenValue,
        ErrorCode::SequentialValue,
        ErrorCode::AsciiValue,
        ErrorCode::DeviatedValue,
        ErrorCode::TableDimensions,
    ];

    /// Code as it appears in reports, e.g. `missing-cell`.
    pub fn as_str(&self) -> &'static str {
        self.entry().0
    }

    pub fn title(&self) -> &'static str {
        self.entry().1
    }

    pub fn tags(&self) -> &'static [&'static str] {
        self.entry().2
    }

    /// Message template; placeholders are filled from the error context.
    pub fn template(&self) -> &'static str {
        self.entry().3
    }

    /// Whether the error aborts the task it occurs in.
    pub fn is_fatal(&self) -> bool {
        self.tags().contains(&"#general")
    }

    fn entry(&self) -> (&'static str, &'static str, &'static [&'static str], &'static str) {
        const GENERAL: &[&str] = &["#general"];
        const STATS: &[&str] = &["#table", "#data", "#integrity"];
        const HEADER: &[&str] = &["#table", "#header", "#structure"];
        const LABEL: &[&str] = &["#table", "#header", "#label", "#structure"];
        const ROW: &[&str] = &["#table", "#row", "#structure"];
        const INTEGRITY_ROW: &[&str] = &["#table", "#row", "#integrity"];
        const STRUCTURE_CELL: &[&str] = &["#table", "#row", "#cell", "#structure"];
        const SCHEMA_CELL: &[&str] = &["#table", "#row", "#cell", "#schema"];
        const CELL_TEMPLATE: &str = "The cell {cell} in row at position {rowNumber} and field {fieldName} at position {fieldNumber} has an error: {note}";

        match self {
            ErrorCode::SchemeError => (
                "scheme-error",
                "Scheme Error",
                GENERAL,
                "The data source could not be successfully loaded: {note}",
            ),
            ErrorCode::FormatError => (
                "format-error",
                "Format Error",
                GENERAL,
                "The data source could not be successfully parsed: {note}",
            ),
            ErrorCode::EncodingError => (
                "encoding-error",
                "Encoding Error",
                GENERAL,
                "The data source could not be successfully decoded: {note}",
            ),
            ErrorCode::CompressionError => (
                "compression-error",
                "Compression Error",
                GENERAL,
                "The data source could not be successfully decompressed: {note}",
            ),
            ErrorCode::HashingError => (
                "hashing-error",
                "Hashing Error",
                GENERAL,
                "The data source could not be successfully hashed: {note}",
            ),
            ErrorCode::DialectError => (
                "dialect-error",
                "Dialect Error",
                GENERAL,
                "Dialect is not valid: {note}",
            ),
            ErrorCode::SchemaError => (
                "schema-error",
                "Schema Error",
                GENERAL,
                "Schema is not valid: {note}",
            ),
            ErrorCode::ResourceError => (
                "resource-error",
                "Resource Error",
                GENERAL,
                "The data resource has an error: {note}",
            ),
            ErrorCode::PackageError => (
                "package-error",
                "Package Error",
                GENERAL,
                "The data package has an error: {note}",
            ),
            ErrorCode::CheckError => (
                "check-error",
                "Check Error",
                &["#table", "#check"],
                "Check is not valid: {note}",
            ),
            ErrorCode::TaskError => (
                "task-error",
                "Task Error",
                GENERAL,
                "The task has an error: {note}",
            ),
            ErrorCode::SourceError => (
                "source-error",
                "Source Error",
                GENERAL,
                "The data source has not supported or has inconsistent contents: {note}",
            ),
            ErrorCode::HashCount => (
                "hash-count",
                "Hash Count Error",
                STATS,
                "The data source does not match the expected hash count: {note}",
            ),
            ErrorCode::ByteCount => (
                "byte-count",
                "Byte Count Error",
                STATS,
                "The data source does not match the expected byte count: {note}",
            ),
            ErrorCode::FieldCount => (
                "field-count",
                "Field Count Error",
                STATS,
                "The data source does not match the expected field count: {note}",
            ),
            ErrorCode::RowCount => (
                "row-count",
                "Row Count Error",
                STATS,
                "The data source does not match the expected row count: {note}",
            ),
            ErrorCode::BlankHeader => (
                "blank-header",
                "Blank Header",
                HEADER,
                "Header in row at position \"{rowNumbers}\" is completely blank",
            ),
            ErrorCode::BlankLabel => (
                "blank-label",
                "Blank Label",
                LABEL,
                "Label in the header in field at position \"{fieldNumber}\" is blank",
            ),
            ErrorCode::DuplicateLabel => (
                "duplicate-label",
                "Duplicate Label",
                LABEL,
                "Label \"{label}\" in the header at position \"{fieldNumber}\" is duplicated to a label: {note}",
            ),
            ErrorCode::ExtraLabel => (
                "extra-label",
                "Extra Label",
                LABEL,
                "There is an extra label \"{label}\" in header at position \"{fieldNumber}\"",
            ),
            ErrorCode::MissingLabel => (
                "missing-label",
                "Missing Label",
                LABEL,
                "There is a missing label in the header's field \"{fieldName}\" at position \"{fieldNumber}\"",
            ),
            ErrorCode::IncorrectLabel => (
                "incorrect-label",
                "Incorrect Label",
                &["#table", "#header", "#label", "#schema"],
                "Label \"{label}\" in field {fieldName} at position \"{fieldNumber}\" does not match the field name in the schema",
            ),
            ErrorCode::BlankRow => (
                "blank-row",
                "Blank Row",
                ROW,
                "Row at position \"{rowNumber}\" is completely blank",
            ),
            ErrorCode::PrimaryKeyError => (
                "primary-key-error",
                "PrimaryKey Error",
                INTEGRITY_ROW,
                "Row at position \"{rowNumber}\" violates the primary key: {note}",
            ),
            ErrorCode::ForeignKeyError => (
                "foreign-key-error",
                "ForeignKey Error",
                INTEGRITY_ROW,
                "Row at position \"{rowNumber}\" violates the foreign key: {note}",
            ),
            ErrorCode::DuplicateRow => (
                "duplicate-row",
                "Duplicate Row",
                &["#table", "#row", "#heuristic"],
                "Row at position {rowNumber} is duplicated: {note}",
            ),
            ErrorCode::ExtraCell => (
                "extra-cell",
                "Extra Cell",
                STRUCTURE_CELL,
                "Row at position \"{rowNumber}\" has an extra value in field at position \"{fieldNumber}\"",
            ),
            ErrorCode::MissingCell => (
                "missing-cell",
                "Missing Cell",
                STRUCTURE_CELL,
                "Row at position \"{rowNumber}\" has a missing cell in field \"{fieldName}\" at position \"{fieldNumber}\"",
            ),
            ErrorCode::TypeError => (
                "type-error",
                "Type Error",
                SCHEMA_CELL,
                "Type error in the cell \"{cell}\" in row \"{rowNumber}\" and field \"{fieldName}\" at position \"{fieldNumber}\": {note}",
            ),
            ErrorCode::ConstraintError => (
                "constraint-error",
                "Constraint Error",
                SCHEMA_CELL,
                "The cell \"{cell}\" in row at position \"{rowNumber}\" and field \"{fieldName}\" at position \"{fieldNumber}\" does not conform to a constraint: {note}",
            ),
            ErrorCode::UniqueError => (
                "unique-error",
                "Unique Error",
                &["#table", "#row", "#cell", "#integrity"],
                "Row at position \"{rowNumber}\" has unique constraint violation in field \"{fieldName}\" at position \"{fieldNumber}\": {note}",
            ),
            ErrorCode::TruncatedValue => (
                "truncated-value",
                "Truncated Value",
                &["#table", "#row", "#cell", "#heuristic"],
                CELL_TEMPLATE,
            ),
            ErrorCode::ForbiddenValue => (
                "forbidden-value",
                "Forbidden Value",
                &["#table", "#row", "#cell", "#regulation"],
                CELL_TEMPLATE,
            ),
            ErrorCode::SequentialValue => (
                "sequential-value",
                "Sequential Value",
                &["#table", "#row", "#cell", "#regulation"],
                CELL_TEMPLATE,
            ),
            ErrorCode::AsciiValue => (
                "ascii-value",
                "Ascii Value",
                &["#table", "#row", "#cell", "#regulation"],
                CELL_TEMPLATE,
            ),
            ErrorCode::DeviatedValue => (
                "deviated-value",
                "Deviated Value",
                &["#table", "#heuristic"],
                "There is a possible error because the value is deviated: {note}",
            ),
            ErrorCode::TableDimensions => (
                "table-dimensions",
                "Table dimensions error",
                &["#table", "#regulation"],
                "The data source does not have the required dimensions: {note}",
            ),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| format!("error type \"{s}\" is not supported"))
    }
}

/// Position an error refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorContext {
    /// The table as a whole (or no table at all)
    Table,
    Header {
        labels: Vec<String>,
        row_numbers: Vec<usize>,
    },
    Label {
        labels: Vec<String>,
        row_numbers: Vec<usize>,
        label: String,
        field_name: String,
        field_number: usize,
    },
    Row {
        cells: Vec<String>,
        row_number: usize,
    },
    Cell {
        cells: Vec<String>,
        row_number: usize,
        cell: String,
        field_name: String,
        field_number: usize,
    },
    ForeignKey {
        cells: Vec<String>,
        row_number: usize,
        field_names: Vec<String>,
        field_values: Vec<Cell>,
        reference_name: String,
        reference_field_names: Vec<String>,
    },
}

/// A single problem found in a table.
///
/// # Example
///
/// ```rust
/// use tabular_validator::{ErrorCode, TableError};
///
/// let error = TableError::row(ErrorCode::BlankRow, "", vec![String::new()], 3);
/// assert_eq!(error.code(), ErrorCode::BlankRow);
/// assert_eq!(error.row_number(), Some(3));
/// assert_eq!(error.to_string(), "Row at position \"3\" is completely blank");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct TableError {
    code: ErrorCode,
    note: String,
    message: String,
    context: ErrorContext,
}

impl TableError {
    fn build(code: ErrorCode, note: impl Into<String>, context: ErrorContext) -> Self {
        let note = note.into();
        let message = render(code.template(), &note, &context);
        Self {
            code,
            note,
            message,
            context,
        }
    }

    /// An error about the table as a whole.
    pub fn general(code: ErrorCode, note: impl Into<String>) -> Self {
        Self::build(code, note, ErrorContext::Table)
    }

    pub fn header(
        code: ErrorCode,
        note: impl Into<String>,
        labels: Vec<String>,
        row_numbers: Vec<usize>,
    ) -> Self {
        Self::build(code, note, ErrorContext::Header { labels, row_numbers })
    }

    pub fn label(
        code: ErrorCode,
        note: impl Into<String>,
        labels: Vec<String>,
        row_numbers: Vec<usize>,
        label: impl Into<String>,
        field_name: impl Into<String>,
        field_number: usize,
    ) -> Self {
        Self::build(
            code,
            note,
            ErrorContext::Label {
                labels,
                row_numbers,
                label: label.into(),
                field_name: field_name.into(),
                field_number,
            },
        )
    }

    pub fn row(code: ErrorCode, note: impl Into<String>, cells: Vec<String>, row_number: usize) -> Self {
        Self::build(code, note, ErrorContext::Row { cells, row_number })
    }

    pub fn cell(
        code: ErrorCode,
        note: impl Into<String>,
        cells: Vec<String>,
        row_number: usize,
        cell: impl Into<String>,
        field_name: impl Into<String>,
        field_number: usize,
    ) -> Self {
        Self::build(
            code,
            note,
            ErrorContext::Cell {
                cells,
                row_number,
                cell: cell.into(),
                field_name: field_name.into(),
                field_number,
            },
        )
    }

    /// A foreign key miss carrying the original cells of the key.
    #[allow(clippy::too_many_arguments)]
    pub fn foreign_key(
        note: impl Into<String>,
        cells: Vec<String>,
        row_number: usize,
        field_names: Vec<String>,
        field_values: Vec<Cell>,
        reference_name: impl Into<String>,
        reference_field_names: Vec<String>,
    ) -> Self {
        Self::build(
            ErrorCode::ForeignKeyError,
            note,
            ErrorContext::ForeignKey {
                cells,
                row_number,
                field_names,
                field_values,
                reference_name: reference_name.into(),
                reference_field_names,
            },
        )
    }

    pub fn scheme(note: impl Into<String>) -> Self {
        Self::general(ErrorCode::SchemeError, note)
    }

    pub fn format(note: impl Into<String>) -> Self {
        Self::general(ErrorCode::FormatError, note)
    }

    pub fn encoding(note: impl Into<String>) -> Self {
        Self::general(ErrorCode::EncodingError, note)
    }

    pub fn compression(note: impl Into<String>) -> Self {
        Self::general(ErrorCode::CompressionError, note)
    }

    pub fn schema(note: impl Into<String>) -> Self {
        Self::general(ErrorCode::SchemaError, note)
    }

    pub fn resource(note: impl Into<String>) -> Self {
        Self::general(ErrorCode::ResourceError, note)
    }

    pub fn package(note: impl Into<String>) -> Self {
        Self::general(ErrorCode::PackageError, note)
    }

    pub fn check(note: impl Into<String>) -> Self {
        Self::general(ErrorCode::CheckError, note)
    }

    pub fn task(note: impl Into<String>) -> Self {
        Self::general(ErrorCode::TaskError, note)
    }

    /// Recovers a `TableError` travelling inside an I/O error, or treats the
    /// I/O error as a `code` error.
    pub fn from_io(error: io::Error, code: ErrorCode) -> Self {
        match error
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<TableError>())
        {
            Some(inner) => inner.clone(),
            None => Self::general(code, error.to_string()),
        }
    }

    /// Wraps the error so that it can travel through `std::io::Read`.
    pub fn into_io(self) -> io::Error {
        io::Error::other(self)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn tags(&self) -> &'static [&'static str] {
        self.code.tags()
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn is_fatal(&self) -> bool {
        self.code.is_fatal()
    }

    /// Whether the error has this code or carries this `#tag`.
    pub fn matches(&self, code_or_tag: &str) -> bool {
        self.code.as_str() == code_or_tag || self.tags().contains(&code_or_tag)
    }

    pub fn row_number(&self) -> Option<usize> {
        match &self.context {
            ErrorContext::Row { row_number, .. }
            | ErrorContext::Cell { row_number, .. }
            | ErrorContext::ForeignKey { row_number, .. } => Some(*row_number),
            _ => None,
        }
    }

    pub fn field_number(&self) -> Option<usize> {
        match &self.context {
            ErrorContext::Label { field_number, .. } | ErrorContext::Cell { field_number, .. } => {
                Some(*field_number)
            }
            _ => None,
        }
    }

    pub fn field_name(&self) -> Option<&str> {
        match &self.context {
            ErrorContext::Label { field_name, .. } | ErrorContext::Cell { field_name, .. } => {
                Some(field_name)
            }
            _ => None,
        }
    }

    /// JSON descriptor of the error, with camelCase keys.
    pub fn to_descriptor(&self) -> Cell {
        let mut map = Map::new();
        map.insert("type".into(), json!(self.code.as_str()));
        map.insert("title".into(), json!(self.code.title()));
        map.insert("tags".into(), json!(self.code.tags()));
        map.insert("note".into(), json!(self.note));
        map.insert("message".into(), json!(self.message));
        match &self.context {
            ErrorContext::Table => {}
            ErrorContext::Header { labels, row_numbers } => {
                map.insert("labels".into(), json!(labels));
                map.insert("rowNumbers".into(), json!(row_numbers));
            }
            ErrorContext::Label {
                labels,
                row_numbers,
                label,
                field_name,
                field_number,
            } => {
                map.insert("labels".into(), json!(labels));
                map.insert("rowNumbers".into(), json!(row_numbers));
                map.insert("label".into(), json!(label));
                map.insert("fieldName".into(), json!(field_name));
                map.insert("fieldNumber".into(), json!(field_number));
            }
            ErrorContext::Row { cells, row_number } => {
                map.insert("cells".into(), json!(cells));
                map.insert("rowNumber".into(), json!(row_number));
            }
            ErrorContext::Cell {
                cells,
                row_number,
                cell,
                field_name,
                field_number,
            } => {
                map.insert("cells".into(), json!(cells));
                map.insert("rowNumber".into(), json!(row_number));
                map.insert("cell".into(), json!(cell));
                map.insert("fieldName".into(), json!(field_name));
                map.insert("fieldNumber".into(), json!(field_number));
            }
            ErrorContext::ForeignKey {
                cells,
                row_number,
                field_names,
                field_values,
                reference_name,
                reference_field_names,
            } => {
                map.insert("cells".into(), json!(cells));
                map.insert("rowNumber".into(), json!(row_number));
                map.insert("fieldNames".into(), json!(field_names));
                map.insert("fieldValues".into(), json!(field_values));
                map.insert("referenceName".into(), json!(reference_name));
                map.insert("referenceFieldNames".into(), json!(reference_field_names));
            }
        }
        Cell::Object(map)
    }
}

impl Serialize for TableError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_descriptor().serialize(serializer)
    }
}

impl From<CoreError> for TableError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::InvalidDialect(message) => Self::general(ErrorCode::DialectError, message),
            CoreError::InvalidDescriptor(message) => Self::resource(message),
            CoreError::InvalidSchema(message) => Self::schema(message),
            CoreError::InvalidField { field, message } => {
                Self::schema(format!("field \"{field}\" is not valid: {message}"))
            }
        }
    }
}

fn render(template: &str, note: &str, context: &ErrorContext) -> String {
    let mut message = template.replace("{note}", note);
    let mut fill = |key: &str, value: String| {
        message = message.replace(&format!("{{{key}}}"), &value);
    };
    match context {
        ErrorContext::Table => {}
        ErrorContext::Header { row_numbers, .. } => {
            fill("rowNumbers", join_numbers(row_numbers));
        }
        ErrorContext::Label {
            row_numbers,
            label,
            field_name,
            field_number,
            ..
        } => {
            fill("rowNumbers", join_numbers(row_numbers));
            fill("label", label.clone());
            fill("fieldName", field_name.clone());
            fill("fieldNumber", field_number.to_string());
        }
        ErrorContext::Row { row_number, .. } | ErrorContext::ForeignKey { row_number, .. } => {
            fill("rowNumber", row_number.to_string());
        }
        ErrorContext::Cell {
            row_number,
            cell,
            field_name,
            field_number,
            ..
        } => {
            fill("rowNumber", row_number.to_string());
            fill("cell", cell.clone());
            fill("fieldName", field_name.clone());
            fill("fieldNumber", field_number.to_string());
        }
    }
    message
}

fn join_numbers(numbers: &[usize]) -> String {
    numbers
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_codes_round_trip() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(code));
            assert!(!code.tags().is_empty());
        }
        assert!("bad-code".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn test_cell_error_message() {
        let error = TableError::cell(
            ErrorCode::TypeError,
            "type is \"integer/default\"",
            vec!["1".into(), "x".into()],
            3,
            "x",
            "id",
            1,
        );
        assert_eq!(
            error.message(),
            "Type error in the cell \"x\" in row \"3\" and field \"id\" at position \"1\": type is \"integer/default\""
        );
        assert_eq!(error.row_number(), Some(3));
        assert_eq!(error.field_number(), Some(1));
        assert!(error.matches("#cell"));
        assert!(error.matches("type-error"));
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_descriptor_keys() {
        let error = TableError::label(
            ErrorCode::MissingLabel,
            "",
            vec!["id".into()],
            vec![1],
            "",
            "name",
            2,
        );
        let descriptor = error.to_descriptor();
        assert_eq!(descriptor["type"], json!("missing-label"));
        assert_eq!(descriptor["fieldName"], json!("name"));
        assert_eq!(descriptor["fieldNumber"], json!(2));
        assert_eq!(descriptor["rowNumbers"], json!([1]));
    }

    #[test]
    fn test_io_round_trip_keeps_error() {
        let error = TableError::encoding("invalid byte");
        let recovered = TableError::from_io(error.clone().into_io(), ErrorCode::SchemeError);
        assert_eq!(recovered, error);

        let plain = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let recovered = TableError::from_io(plain, ErrorCode::SchemeError);
        assert_eq!(recovered.code(), ErrorCode::SchemeError);
        assert!(recovered.is_fatal());
    }

    #[test]
    fn test_core_errors_map_to_codes() {
        let error: TableError = CoreError::schema("bad").into();
        assert_eq!(error.code(), ErrorCode::SchemaError);
        assert_eq!(error.to_string(), "Schema is not valid: bad");
        let error: TableError = CoreError::field("id", "bad").into();
        assert_eq!(error.note(), "field \"id\" is not valid: bad");
        let error: TableError = CoreError::dialect("bad").into();
        assert_eq!(error.code(), ErrorCode::DialectError);
    }
}
