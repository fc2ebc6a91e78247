use super::{CellRow, CellRows, Parser, ParserInput, item_cells, item_keys, item_rows};
use crate::{ErrorCode, Result, TableError};
use std::io::{BufRead, BufReader, Read};
use tabular_core::{Cell, Dialect};

/// A JSON document holding an array of rows, optionally nested under the
/// dotted `property` path of the dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl Parser for JsonParser {
    fn read_cell_rows(&self, input: ParserInput, dialect: &Dialect) -> Result<CellRows> {
        let document = match input {
            ParserInput::Text(mut stream) => {
                let mut text = String::new();
                stream
                    .read_to_string(&mut text)
                    .map_err(|error| TableError::from_io(error, ErrorCode::SchemeError))?;
                serde_json::from_str::<Cell>(&text)
                    .map_err(|error| TableError::format(format!("invalid JSON: {error}")))?
            }
            ParserInput::Data(items) => Cell::Array(items),
        };

        let mut target = document;
        if let Some(property) = dialect.property.as_deref() {
            for key in property.split('.') {
                target = match target {
                    Cell::Object(mut map) => map.remove(key),
                    _ => None,
                }
                .ok_or_else(|| {
                    TableError::format(format!("property \"{property}\" is not in the document"))
                })?;
            }
        }
        let Cell::Array(items) = target else {
            return Err(TableError::format("cannot extract tabular data from JSON"));
        };

        Ok(Box::new(item_rows(items, dialect).map(Ok)))
    }
}

/// One JSON item per line (`ndjson`, `jsonl`), read lazily.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdjsonParser;

impl Parser for NdjsonParser {
    fn read_cell_rows(&self, input: ParserInput, dialect: &Dialect) -> Result<CellRows> {
        let ParserInput::Text(stream) = input else {
            return Err(TableError::format("ndjson requires a byte source"));
        };
        let mut lines = NdjsonLines {
            lines: BufReader::new(stream).lines(),
            line_number: 0,
        };

        let first = lines.next().transpose()?;
        let keys = item_keys(first.as_ref(), dialect);
        let header: Option<CellRow> = keys
            .as_ref()
            .map(|keys| keys.iter().map(|key| Cell::String(key.clone())).collect());
        let keys = keys.unwrap_or_default();
        let first_keys = keys.clone();

        let rows = header
            .into_iter()
            .map(Ok)
            .chain(first.map(move |item| Ok(item_cells(item, &first_keys))))
            .chain(lines.map(move |item| item.map(|item| item_cells(item, &keys))));
        Ok(Box::new(rows))
    }
}

struct NdjsonLines<R> {
    lines: std::io::Lines<R>,
    line_number: usize,
}

impl<R: BufRead> Iterator for NdjsonLines<R> {
    type Item = Result<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(error) => return Some(Err(TableError::from_io(error, ErrorCode::SchemeError))),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|error| {
                TableError::format(format!("invalid JSON at line {}: {error}", self.line_number))
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Cursor;

    fn text(content: &str) -> ParserInput {
        ParserInput::Text(Box::new(Cursor::new(content.as_bytes().to_vec())))
    }

    #[test]
    fn test_json_array_rows() {
        let rows: Result<Vec<_>> = JsonParser
            .read_cell_rows(text(r#"[["id", "name"], [1, "english"]]"#), &Dialect::new())
            .unwrap()
            .collect();
        assert_eq!(
            rows.unwrap(),
            vec![vec![json!("id"), json!("name")], vec![json!(1), json!("english")]]
        );
    }

    #[test]
    fn test_json_property_path() {
        let mut dialect = Dialect::new();
        dialect.property = Some("data.rows".into());
        let rows: Result<Vec<_>> = JsonParser
            .read_cell_rows(text(r#"{"data": {"rows": [{"id": 1}]}}"#), &dialect)
            .unwrap()
            .collect();
        assert_eq!(rows.unwrap(), vec![vec![json!("id")], vec![json!(1)]]);
    }

    #[test]
    fn test_json_not_tabular() {
        let error = JsonParser
            .read_cell_rows(text(r#"{"id": 1}"#), &Dialect::new())
            .err()
            .unwrap();
        assert_eq!(error.code(), ErrorCode::FormatError);
    }

    #[test]
    fn test_invalid_json() {
        let error = JsonParser
            .read_cell_rows(text("[1,"), &Dialect::new())
            .err()
            .unwrap();
        assert_eq!(error.code(), ErrorCode::FormatError);
    }

    #[test]
    fn test_ndjson_keyed_rows() {
        let rows: Result<Vec<_>> = NdjsonParser
            .read_cell_rows(
                text("{\"id\": 1, \"name\": \"a\"}\n\n{\"id\": 2}\n"),
                &Dialect::new(),
            )
            .unwrap()
            .collect();
        assert_eq!(
            rows.unwrap(),
            vec![
                vec![json!("id"), json!("name")],
                vec![json!(1), json!("a")],
                vec![json!(2), Cell::Null],
            ]
        );
    }

    #[test]
    fn test_ndjson_bad_line_ends_stream() {
        let mut rows = NdjsonParser
            .read_cell_rows(text("[\"id\"]\n[1]\nnope\n"), &Dialect::new())
            .unwrap();
        assert_eq!(rows.next().unwrap().unwrap(), vec![json!("id")]);
        assert_eq!(rows.next().unwrap().unwrap(), vec![json!(1)]);
        let error = rows.next().unwrap().unwrap_err();
        assert_eq!(error.code(), ErrorCode::FormatError);
        assert!(error.note().contains("line 3"));
    }

    #[test]
    fn test_ndjson_empty() {
        let rows: Vec<_> = NdjsonParser
            .read_cell_rows(text(""), &Dialect::new())
            .unwrap()
            .collect();
        assert!(rows.is_empty());
    }
}
