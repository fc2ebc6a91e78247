use super::{CellRows, Parser, ParserInput, item_rows};
use crate::{Result, TableError};
use tabular_core::Dialect;

/// Rows given inline in the resource descriptor (`data`).
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineParser;

impl Parser for InlineParser {
    fn requires_loader(&self) -> bool {
        false
    }

    fn read_cell_rows(&self, input: ParserInput, dialect: &Dialect) -> Result<CellRows> {
        let ParserInput::Data(items) = input else {
            return Err(TableError::format("inline data requires a \"data\" property"));
        };
        Ok(Box::new(item_rows(items, dialect).map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_inline_rows() {
        let rows: Result<Vec<_>> = InlineParser
            .read_cell_rows(
                ParserInput::Data(vec![json!(["id"]), json!([1]), json!([2])]),
                &Dialect::new(),
            )
            .unwrap()
            .collect();
        assert_eq!(rows.unwrap().len(), 3);
    }

    #[test]
    fn test_inline_requires_data() {
        let error = InlineParser
            .read_cell_rows(ParserInput::Text(Box::new(Cursor::new(Vec::new()))), &Dialect::new())
            .err()
            .unwrap();
        assert_eq!(error.code(), ErrorCode::FormatError);
    }
}
