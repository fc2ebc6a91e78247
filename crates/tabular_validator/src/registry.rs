//! Closed tables of byte stream providers and row producers.
//!
//! A [`Registry`] is built once at configuration time and passed explicitly
//! to resources. Unknown schemes and formats are errors, never fallbacks.
//!
//! # Example
//!
//! ```rust
//! use tabular_validator::parsers::CsvParser;
//! use tabular_validator::{ErrorCode, Registry};
//!
//! let registry = Registry::default().with_parser("psv", CsvParser::new());
//! assert!(registry.parser("psv").is_ok());
//! assert_eq!(registry.parser("xlsx").unwrap_err().code(), ErrorCode::FormatError);
//! ```

use crate::loader::{BufferLoader, FileLoader, Loader};
use crate::parsers::{CsvParser, InlineParser, JsonParser, NdjsonParser, Parser};
use crate::{Result, TableError};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Registry {
    loaders: BTreeMap<String, Arc<dyn Loader>>,
    parsers: BTreeMap<String, Arc<dyn Parser>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
            .with_loader("file", FileLoader)
            .with_loader("buffer", BufferLoader)
            .with_parser("csv", CsvParser::new())
            .with_parser("tsv", CsvParser::tsv())
            .with_parser("json", JsonParser)
            .with_parser("ndjson", NdjsonParser)
            .with_parser("jsonl", NdjsonParser)
            .with_parser("inline", InlineParser)
    }
}

impl Registry {
    /// A registry without any scheme or format.
    pub fn empty() -> Self {
        Self {
            loaders: BTreeMap::new(),
            parsers: BTreeMap::new(),
        }
    }

    pub fn with_loader(mut self, scheme: impl Into<String>, loader: impl Loader + 'static) -> Self {
        self.loaders.insert(scheme.into(), Arc::new(loader));
        self
    }

    pub fn with_parser(mut self, format: impl Into<String>, parser: impl Parser + 'static) -> Self {
        self.parsers.insert(format.into(), Arc::new(parser));
        self
    }

    pub fn loader(&self, scheme: &str) -> Result<Arc<dyn Loader>> {
        self.loaders
            .get(scheme)
            .cloned()
            .ok_or_else(|| TableError::scheme(format!("scheme \"{scheme}\" is not supported")))
    }

    pub fn parser(&self, format: &str) -> Result<Arc<dyn Parser>> {
        self.parsers
            .get(format)
            .cloned()
            .ok_or_else(|| TableError::format(format!("format \"{format}\" is not supported")))
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }
}
