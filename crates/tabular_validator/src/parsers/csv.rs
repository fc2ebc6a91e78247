use super::{CellRow, CellRows, Parser, ParserInput};
use crate::loader::ByteStream;
use crate::{ErrorCode, Result, TableError};
use csv::{Reader, ReaderBuilder, StringRecord, Terminator, Trim};
use std::collections::VecDeque;
use std::io::{self, Read};
use tabular_core::{Cell, Dialect};
use tracing::debug;

const CANDIDATES: [char; 4] = [',', ';', '\t', '|'];
const SNIFF_LINES: usize = 10;

/// Delimited text (`csv`, `tsv`).
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    delimiter: Option<char>,
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tab separated values; the delimiter is fixed.
    pub fn tsv() -> Self {
        Self {
            delimiter: Some('\t'),
        }
    }
}

impl Parser for CsvParser {
    fn infer_dialect(&self, sample: &str, dialect: &mut Dialect) {
        if dialect.delimiter.is_some() {
            return;
        }
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(sample));
        debug!("Using delimiter {delimiter:?}");
        dialect.delimiter = Some(delimiter.to_string());
    }

    fn read_cell_rows(&self, input: ParserInput, dialect: &Dialect) -> Result<CellRows> {
        let ParserInput::Text(stream) = input else {
            return Err(TableError::format("delimited text requires a byte source"));
        };

        let delimiter = match (&dialect.delimiter, self.delimiter) {
            (Some(delimiter), _) => single_byte("delimiter", delimiter)?,
            (None, Some(fixed)) => fixed as u8,
            (None, None) => b',',
        };
        let quote = match &dialect.quote_char {
            Some(quote) => single_byte("quoteChar", quote)?,
            None => b'"',
        };
        let escape = dialect
            .escape_char
            .as_deref()
            .map(|escape| single_byte("escapeChar", escape))
            .transpose()?;

        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .quote(quote)
            .double_quote(dialect.double_quote.unwrap_or(true))
            .escape(escape)
            .terminator(Terminator::Any(b'\n'));
        if dialect.skip_initial_space.unwrap_or(false) {
            builder.trim(Trim::Fields);
        }

        let reader = builder.from_reader(Terminated::new(stream));
        Ok(Box::new(Records::new(reader)))
    }
}

/// Appends a final line terminator when the text lacks one, so every
/// record ends with a newline.
struct Terminated<R> {
    inner: R,
    last: Option<u8>,
    finished: bool,
}

impl<R: Read> Terminated<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            last: None,
            finished: false,
        }
    }
}

impl<R: Read> Read for Terminated<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.finished || buf.is_empty() {
            return Ok(0);
        }
        let read = self.inner.read(buf)?;
        if read > 0 {
            self.last = Some(buf[read - 1]);
            return Ok(read);
        }
        self.finished = true;
        if self.last.is_some_and(|byte| byte != b'\n') {
            buf[0] = b'\n';
            return Ok(1);
        }
        Ok(0)
    }
}

/// Records of a delimited text, with empty lines restored as empty rows.
///
/// The reader skips empty lines; they are recovered from the line count
/// consumed per record minus the newlines quoted inside its cells. Records
/// end on `\n`; a `\r` before it is dropped from the last cell.
struct Records {
    reader: Reader<Terminated<ByteStream>>,
    record: StringRecord,
    line: u64,
    queue: VecDeque<CellRow>,
    done: bool,
}

impl Records {
    fn new(reader: Reader<Terminated<ByteStream>>) -> Self {
        let line = reader.position().line();
        Self {
            reader,
            record: StringRecord::new(),
            line,
            queue: VecDeque::new(),
            done: false,
        }
    }

    fn blank_rows(&mut self, count: u64) {
        for _ in 0..count {
            self.queue.push_back(Vec::new());
        }
    }
}

impl Iterator for Records {
    type Item = Result<CellRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cells) = self.queue.pop_front() {
                return Some(Ok(cells));
            }
            if self.done {
                return None;
            }
            let read = self.reader.read_record(&mut self.record);
            let consumed = self.reader.position().line().saturating_sub(self.line);
            self.line = self.reader.position().line();
            match read {
                Ok(true) => {
                    let quoted: u64 = self
                        .record
                        .iter()
                        .map(|cell| cell.matches('\n').count() as u64)
                        .sum();
                    self.blank_rows(consumed.saturating_sub(quoted + 1));
                    let mut cells: CellRow = self
                        .record
                        .iter()
                        .map(|cell| Cell::String(cell.to_string()))
                        .collect();
                    if let Some(Cell::String(last)) = cells.last_mut()
                        && last.ends_with('\r')
                    {
                        last.pop();
                    }
                    self.queue.push_back(cells);
                }
                Ok(false) => {
                    self.done = true;
                    self.blank_rows(consumed);
                }
                Err(error) => {
                    self.done = true;
                    self.queue.clear();
                    return Some(Err(csv_error(error)));
                }
            }
        }
    }
}

fn single_byte(name: &str, value: &str) -> Result<u8> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(TableError::general(
            ErrorCode::DialectError,
            format!("{name} \"{value}\" must be a single ASCII character"),
        )),
    }
}

fn csv_error(error: csv::Error) -> TableError {
    let message = error.to_string();
    match error.into_kind() {
        csv::ErrorKind::Io(error) => TableError::from_io(error, ErrorCode::SchemeError),
        _ => TableError::format(message),
    }
}

/// Picks the candidate delimiter that occurs the same number of times on
/// every sampled line, preferring the most frequent; falls back to the most
/// frequent overall, then to a comma.
pub(crate) fn sniff_delimiter(sample: &str) -> char {
    let mut lines: Vec<&str> = sample.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.len() > 1 && !sample.ends_with('\n') {
        lines.pop();
    }
    lines.truncate(SNIFF_LINES);

    let mut consistent: Option<(char, usize)> = None;
    let mut frequent: Option<(char, usize)> = None;
    for candidate in CANDIDATES {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| line.matches(candidate).count())
            .collect();
        let total: usize = counts.iter().sum();
        if total == 0 {
            continue;
        }
        let per_line = counts[0];
        if per_line > 0
            && counts.iter().all(|count| *count == per_line)
            && consistent.is_none_or(|(_, best)| per_line > best)
        {
            consistent = Some((candidate, per_line));
        }
        if frequent.is_none_or(|(_, best)| total > best) {
            frequent = Some((candidate, total));
        }
    }

    consistent
        .or(frequent)
        .map(|(candidate, _)| candidate)
        .unwrap_or(',')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Cursor;

    fn parse(text: &str, dialect: &Dialect) -> Result<Vec<Vec<Cell>>> {
        let stream = Box::new(Cursor::new(text.as_bytes().to_vec()));
        CsvParser::new()
            .read_cell_rows(ParserInput::Text(stream), dialect)?
            .collect()
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("id;name\n1;english\n2;中国人\n"), ';');
        assert_eq!(sniff_delimiter("id\tname\n1\tenglish\n"), '\t');
        assert_eq!(sniff_delimiter("id\n1\n"), ',');
        assert_eq!(sniff_delimiter("a,b;c\n1,2;3\n"), ',');
    }

    #[test]
    fn test_sniff_ignores_truncated_last_line() {
        assert_eq!(sniff_delimiter("a|b\n1|2\n3,4,5,6,7"), '|');
    }

    #[test]
    fn test_parse_ragged_rows() {
        let rows = parse("id,name\n1,english,extra\n2\n", &Dialect::new()).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![json!("id"), json!("name")],
                vec![json!("1"), json!("english"), json!("extra")],
                vec![json!("2")],
            ]
        );
    }

    #[test]
    fn test_parse_keeps_blank_lines() {
        let rows = parse("id\n1\n\n\n2\n\n", &Dialect::new()).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![json!("id")],
                vec![json!("1")],
                vec![],
                vec![],
                vec![json!("2")],
                vec![],
            ]
        );
    }

    #[test]
    fn test_parse_multiline_cell_and_missing_terminator() {
        let rows = parse("id,note\n1,\"a\nb\"\n\n2,c", &Dialect::new()).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![json!("id"), json!("note")],
                vec![json!("1"), json!("a\nb")],
                vec![],
                vec![json!("2"), json!("c")],
            ]
        );
    }

    #[test]
    fn test_parse_crlf() {
        let rows = parse("id,name\r\n1,\"english\"\r\n\r\n", &Dialect::new()).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![json!("id"), json!("name")],
                vec![json!("1"), json!("english")],
                vec![json!("")],
            ]
        );
    }

    #[test]
    fn test_parse_quoted_cells() {
        let rows = parse("id,note\n1,\"a, \"\"b\"\"\"\n", &Dialect::new()).unwrap();
        assert_eq!(rows[1], vec![json!("1"), json!("a, \"b\"")]);
    }

    #[test]
    fn test_parse_with_dialect() {
        let mut dialect = Dialect::new().with_delimiter(";");
        dialect.skip_initial_space = Some(true);
        let rows = parse("id; name\n1; english\n", &dialect).unwrap();
        assert_eq!(rows[1], vec![json!("1"), json!("english")]);
    }

    #[test]
    fn test_invalid_delimiter_is_dialect_error() {
        let error = parse("id\n", &Dialect::new().with_delimiter("::")).unwrap_err();
        assert_eq!(error.code(), ErrorCode::DialectError);
    }

    #[test]
    fn test_infer_dialect_keeps_explicit_delimiter() {
        let mut dialect = Dialect::new().with_delimiter("|");
        CsvParser::new().infer_dialect("a;b\n1;2\n", &mut dialect);
        assert_eq!(dialect.delimiter.as_deref(), Some("|"));

        let mut dialect = Dialect::new();
        CsvParser::tsv().infer_dialect("a;b\n1;2\n", &mut dialect);
        assert_eq!(dialect.delimiter.as_deref(), Some("\t"));
    }
}
