use super::Check;
use crate::resource::OpenTable;
use crate::row::Row;
use crate::{ErrorCode, Result, TableError};
use tabular_core::ResourceDescriptor;

/// Expectations declared by a resource descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectedTable {
    /// `(algorithm, digest)`
    pub hash: Option<(String, String)>,
    pub bytes: Option<u64>,
    pub fields: Option<usize>,
    pub rows: Option<usize>,
}

impl ExpectedTable {
    /// Unsupported hash algorithms are dropped.
    pub fn from_descriptor(descriptor: &ResourceDescriptor) -> Self {
        let stats = descriptor.stats.clone().unwrap_or_default();
        Self {
            hash: descriptor.hash.as_deref().and_then(parse_hash),
            bytes: descriptor.bytes,
            fields: stats.fields,
            rows: stats.rows,
        }
    }
}

/// Splits `md5:…`/`sha256:…`; an unprefixed digest is recognized by its
/// length. Other algorithms are `None`.
pub fn parse_hash(hash: &str) -> Option<(String, String)> {
    let (algorithm, digest) = match hash.split_once(':') {
        Some((algorithm, digest)) => (algorithm.to_lowercase(), digest),
        None => match hash.len() {
            32 => ("md5".to_string(), hash),
            64 => ("sha256".to_string(), hash),
            _ => return None,
        },
    };
    matches!(algorithm.as_str(), "md5" | "sha256")
        .then(|| (algorithm, digest.to_lowercase()))
}

/// Structural errors found while reading (header, rows, integrity) plus
/// the declared stats compared at the end.
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    expected: ExpectedTable,
}

const EMITS: &[ErrorCode] = &[
    ErrorCode::HashCount,
    ErrorCode::ByteCount,
    ErrorCode::FieldCount,
    ErrorCode::RowCount,
    ErrorCode::BlankHeader,
    ErrorCode::ExtraLabel,
    ErrorCode::MissingLabel,
    ErrorCode::BlankLabel,
    ErrorCode::DuplicateLabel,
    ErrorCode::IncorrectLabel,
    ErrorCode::BlankRow,
    ErrorCode::PrimaryKeyError,
    ErrorCode::ForeignKeyError,
    ErrorCode::ExtraCell,
    ErrorCode::MissingCell,
    ErrorCode::TypeError,
    ErrorCode::ConstraintError,
    ErrorCode::UniqueError,
];

impl Baseline {
    pub fn new(expected: ExpectedTable) -> Self {
        Self { expected }
    }
}

fn mismatch(code: ErrorCode, expected: impl ToString, actual: impl ToString) -> TableError {
    TableError::general(
        code,
        format!(
            "expected is \"{}\" and actual is \"{}\"",
            expected.to_string(),
            actual.to_string()
        ),
    )
}

impl Check for Baseline {
    fn code(&self) -> &'static str {
        "baseline"
    }

    fn emits(&self) -> &'static [ErrorCode] {
        EMITS
    }

    fn start(&mut self, table: &OpenTable) -> Result<Vec<TableError>> {
        Ok(table.header().errors().to_vec())
    }

    fn validate_row(&mut self, row: &Row) -> Vec<TableError> {
        row.errors().to_vec()
    }

    fn validate_end(&mut self, table: &OpenTable) -> Vec<TableError> {
        let mut errors = Vec::new();
        let stats = table.byte_stats();

        if let Some((algorithm, digest)) = &self.expected.hash {
            let actual = match algorithm.as_str() {
                "md5" => stats.md5.clone(),
                _ => stats.sha256.clone(),
            };
            if let Some(actual) = actual
                && &actual != digest
            {
                errors.push(mismatch(ErrorCode::HashCount, digest, actual));
            }
        }
        if let Some(bytes) = self.expected.bytes
            && bytes != stats.bytes
        {
            errors.push(mismatch(ErrorCode::ByteCount, bytes, stats.bytes));
        }
        if let Some(fields) = self.expected.fields {
            let actual = table.schema().fields.len();
            if fields != actual {
                errors.push(mismatch(ErrorCode::FieldCount, fields, actual));
            }
        }
        if let Some(rows) = self.expected.rows
            && rows != table.row_count()
        {
            errors.push(mismatch(ErrorCode::RowCount, rows, table.row_count()));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableResource;
    use pretty_assertions::assert_eq;

    fn run(expected: ExpectedTable) -> Vec<TableError> {
        let resource = TableResource::from_bytes(b"id\n1\n2\n".to_vec(), "csv");
        let mut table = resource.open().unwrap();
        let mut check = Baseline::new(expected);
        let mut errors = check.start(&table).unwrap();
        let rows: Vec<Row> = table.rows().collect::<Result<_>>().unwrap();
        for row in &rows {
            errors.extend(check.validate_row(row));
        }
        errors.extend(check.validate_end(&table));
        errors
    }

    #[test]
    fn test_parse_hash() {
        let md5 = "a".repeat(32);
        assert_eq!(parse_hash(&md5), Some(("md5".into(), md5.clone())));
        assert_eq!(
            parse_hash("SHA256:ABC"),
            Some(("sha256".to_string(), "abc".to_string()))
        );
        assert_eq!(parse_hash("sha1:abc"), None);
        assert_eq!(parse_hash("short"), None);
    }

    #[test]
    fn test_matching_stats() {
        let expected = ExpectedTable {
            hash: parse_hash("md5:e1b1fe0b8ee3ea5e0a07ef0e0f3e7f4e"),
            bytes: Some(7),
            fields: Some(1),
            rows: Some(2),
        };
        let errors = run(expected);
        let codes: Vec<ErrorCode> = errors.iter().map(TableError::code).collect();
        // only the made-up digest differs
        assert_eq!(codes, vec![ErrorCode::HashCount]);
    }

    #[test]
    fn test_mismatching_stats() {
        let expected = ExpectedTable {
            hash: None,
            bytes: Some(8),
            fields: Some(2),
            rows: Some(3),
        };
        let errors = run(expected);
        let codes: Vec<ErrorCode> = errors.iter().map(TableError::code).collect();
        assert_eq!(
            codes,
            vec![ErrorCode::ByteCount, ErrorCode::FieldCount, ErrorCode::RowCount]
        );
        assert_eq!(errors[2].note(), "expected is \"3\" and actual is \"2\"");
    }
}
