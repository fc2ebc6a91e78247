//! Tabular dialect: header layout, comments and format controls.

use crate::{Cell, CoreError, Result, stringify_cell};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_header_rows() -> Vec<usize> {
    vec![1]
}

fn default_header_join() -> String {
    " ".to_string()
}

/// Layout of a tabular source.
///
/// Header options apply to every format. Delimiter/quoting options are read
/// by the CSV parser, `keyed`/`keys`/`property` by the JSON and inline
/// parsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialect {
    /// Whether the source has a header
    #[serde(default = "default_true")]
    pub header: bool,

    /// Physical row numbers (1-based) forming the header
    #[serde(default = "default_header_rows")]
    pub header_rows: Vec<usize>,

    /// Joiner of multi-row header labels
    #[serde(default = "default_header_join")]
    pub header_join: String,

    /// Whether labels are compared case-sensitively
    #[serde(default = "default_true")]
    pub header_case: bool,

    /// Rows whose first cell starts with this prefix are skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_char: Option<String>,

    /// Physical row numbers to skip
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment_rows: Vec<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_char: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_quote: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub escape_char: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_initial_space: Option<bool>,

    /// Rows are objects rather than arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyed: Option<bool>,

    /// Keys to read from keyed rows, in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,

    /// Dot-separated path to the data array inside a JSON document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect {
    pub fn new() -> Self {
        Self {
            header: true,
            header_rows: default_header_rows(),
            header_join: default_header_join(),
            header_case: true,
            comment_char: None,
            comment_rows: Vec::new(),
            delimiter: None,
            quote_char: None,
            double_quote: None,
            escape_char: None,
            skip_initial_space: None,
            keyed: None,
            keys: None,
            property: None,
        }
    }

    /// Sets whether the source has a header.
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Sets the header row numbers.
    pub fn with_header_rows(mut self, rows: Vec<usize>) -> Self {
        self.header_rows = rows;
        self
    }

    /// Sets the CSV delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Last physical row belonging to the header (0 without a header).
    pub fn header_last_row(&self) -> usize {
        if !self.header {
            return 0;
        }
        self.header_rows.iter().copied().max().unwrap_or(0)
    }

    /// Whether a physical row is a comment and must be skipped.
    pub fn is_comment_row(&self, row_number: usize, cells: &[Cell]) -> bool {
        if self.comment_rows.contains(&row_number) {
            return true;
        }
        match (&self.comment_char, cells.first()) {
            (Some(prefix), Some(Cell::String(first))) => first.starts_with(prefix.as_str()),
            _ => false,
        }
    }

    /// Reads labels from the header rows of a sample, joining multi-row
    /// headers column by column.
    pub fn read_labels(&self, sample: &[Vec<Cell>]) -> Vec<String> {
        if !self.header {
            return Vec::new();
        }

        let last = self.header_last_row();
        let rows = sample
            .iter()
            .enumerate()
            .take(last)
            .filter(|(index, _)| self.header_rows.contains(&(index + 1)));

        let mut labels: Vec<String> = Vec::new();
        let mut previous: Vec<Option<String>> = Vec::new();
        for (_, cells) in rows {
            for (index, cell) in cells.iter().enumerate() {
                let cell = stringify_cell(cell);
                if previous.len() <= index {
                    previous.resize(index + 1, None);
                }
                if previous[index].as_deref() == Some(cell.as_str()) {
                    continue;
                }
                previous[index] = Some(cell.clone());
                if labels.len() <= index {
                    labels.resize(index + 1, String::new());
                    labels[index] = cell;
                    continue;
                }
                labels[index] = [labels[index].as_str(), cell.as_str()].join(&self.header_join);
            }
        }
        labels
    }

    /// Data rows of a sample with their physical row numbers, excluding
    /// header and comment rows.
    pub fn read_fragment(&self, sample: &[Vec<Cell>]) -> (Vec<Vec<Cell>>, Vec<usize>) {
        let first_header_row = self.header_rows.iter().copied().min().unwrap_or(1);
        let mut fragment = Vec::new();
        let mut positions = Vec::new();
        for (index, cells) in sample.iter().enumerate() {
            let row_number = index + 1;
            if self.header
                && (row_number < first_header_row || self.header_rows.contains(&row_number))
            {
                continue;
            }
            if self.is_comment_row(row_number, cells) {
                continue;
            }
            fragment.push(cells.clone());
            positions.push(row_number);
        }
        (fragment, positions)
    }

    /// Problems with the dialect descriptor.
    pub fn validate(&self) -> Result<()> {
        if self.header && self.header_rows.is_empty() {
            return Err(CoreError::dialect("headerRows must not be empty"));
        }
        if self.header_rows.contains(&0) {
            return Err(CoreError::dialect("headerRows are 1-based row numbers"));
        }
        if let Some(delimiter) = &self.delimiter
            && delimiter.len() != 1
        {
            return Err(CoreError::dialect(format!(
                "delimiter \"{delimiter}\" must be a single byte"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rows(rows: &[&[&str]]) -> Vec<Vec<Cell>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| json!(cell)).collect())
            .collect()
    }

    #[test]
    fn test_read_labels_single_row() {
        let sample = rows(&[&["id", "name"], &["1", "english"]]);
        assert_eq!(Dialect::new().read_labels(&sample), vec!["id", "name"]);
        assert!(Dialect::new().with_header(false).read_labels(&sample).is_empty());
    }

    #[test]
    fn test_read_labels_multiline() {
        let sample = rows(&[
            &["id", "name", "name"],
            &["", "first", "last"],
            &["1", "john", "doe"],
        ]);
        let dialect = Dialect::new().with_header_rows(vec![1, 2]);
        assert_eq!(
            dialect.read_labels(&sample),
            vec!["id ", "name first", "name last"]
        );
        let (fragment, positions) = dialect.read_fragment(&sample);
        assert_eq!(fragment.len(), 1);
        assert_eq!(positions, vec![3]);
    }

    #[test]
    fn test_read_fragment_skips_comments() {
        let sample = rows(&[&["id"], &["1"], &["# note"], &["2"]]);
        let mut dialect = Dialect::new();
        dialect.comment_char = Some("#".into());
        let (_, positions) = dialect.read_fragment(&sample);
        assert_eq!(positions, vec![2, 4]);

        let mut dialect = Dialect::new();
        dialect.comment_rows = vec![2];
        let (_, positions) = dialect.read_fragment(&sample);
        assert_eq!(positions, vec![3, 4]);
    }

    #[test]
    fn test_descriptor_defaults() {
        let dialect: Dialect = serde_json::from_value(json!({"delimiter": ";"})).unwrap();
        assert!(dialect.header);
        assert_eq!(dialect.header_rows, vec![1]);
        assert_eq!(dialect.header_join, " ");
        assert!(dialect.validate().is_ok());

        let dialect: Dialect = serde_json::from_value(json!({"delimiter": ";;"})).unwrap();
        assert!(dialect.validate().is_err());
    }
}
