//! Cell row producers.
//!
//! A [`Parser`] turns a decoded text stream (or inline data) into a lazy,
//! single-pass sequence of raw cell rows. Text formats produce string cells,
//! JSON formats produce already typed cells.

mod csv;
mod inline;
mod json;

pub use self::csv::CsvParser;
pub use inline::InlineParser;
pub use json::{JsonParser, NdjsonParser};

use crate::loader::ByteStream;
use crate::Result;
use std::fmt;
use tabular_core::{Cell, Dialect};

/// One row of raw cells as produced by a parser.
pub type CellRow = Vec<Cell>;

/// Lazy sequence of cell rows; an `Err` ends the sequence.
pub type CellRows = Box<dyn Iterator<Item = Result<CellRow>> + Send>;

/// What a parser reads from.
pub enum ParserInput {
    /// Decoded UTF-8 text
    Text(ByteStream),
    /// Inline rows of a resource descriptor
    Data(Vec<Cell>),
}

/// Produces cell rows for one format.
pub trait Parser: Send + Sync + fmt::Debug {
    /// Whether the parser reads a byte stream (inline data does not).
    fn requires_loader(&self) -> bool {
        true
    }

    /// Completes the dialect from a decoded sample of the text.
    fn infer_dialect(&self, _sample: &str, _dialect: &mut Dialect) {}

    fn read_cell_rows(&self, input: ParserInput, dialect: &Dialect) -> Result<CellRows>;
}

/// Keys of keyed items: `dialect.keys`, or the keys of the first object.
/// `None` when the items are arrays.
pub(crate) fn item_keys(first: Option<&Cell>, dialect: &Dialect) -> Option<Vec<String>> {
    let keyed = dialect.keyed.unwrap_or(false) || matches!(first, Some(Cell::Object(_)));
    if !keyed {
        return None;
    }
    Some(dialect.keys.clone().unwrap_or_else(|| match first {
        Some(Cell::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }))
}

/// Turns JSON items (arrays or keyed objects) into cell rows; for keyed
/// items the keys are emitted first as the header row.
pub(crate) fn item_rows(
    items: Vec<Cell>,
    dialect: &Dialect,
) -> impl Iterator<Item = CellRow> + Send + use<> {
    let keys = item_keys(items.first(), dialect);
    let header = keys
        .as_ref()
        .map(|keys| keys.iter().map(|key| Cell::String(key.clone())).collect());
    let keys = keys.unwrap_or_default();
    header
        .into_iter()
        .chain(items.into_iter().map(move |item| item_cells(item, &keys)))
}

pub(crate) fn item_cells(item: Cell, keys: &[String]) -> CellRow {
    match item {
        Cell::Array(cells) => cells,
        Cell::Object(mut map) => keys
            .iter()
            .map(|key| map.remove(key).unwrap_or(Cell::Null))
            .collect(),
        other => vec![other],
    }
}
