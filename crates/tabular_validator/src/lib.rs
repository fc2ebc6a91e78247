//! # Tabular Validator
//!
//! Detection, reading and validation engine for tabular data. This crate
//! turns a resource (a file, in-memory bytes or inline rows) into a lazy
//! stream of typed rows and validates it against a schema:
//!
//! - Loading with byte counting and hashing, gzip and zip decompression
//! - Encoding, dialect and schema detection from a sample
//! - CSV, TSV, JSON, NDJSON and inline data parsers
//! - Header and row errors, unique, primary and foreign keys
//! - Pluggable heuristic and regulation checks, error filtering and limits
//! - Reports for single resources and whole packages
//!
//! ## Example
//!
//! ```rust
//! use tabular_validator::{TableResource, ValidateOptions, Validator};
//!
//! let data = b"id,name\n1,english\n2,german\n".to_vec();
//! let report = Validator::new(ValidateOptions::default())
//!     .validate_resource(&TableResource::from_bytes(data, "csv"));
//!
//! assert!(report.valid);
//! assert_eq!(report.tasks[0].stats.rows, Some(2));
//! ```

pub mod checklist;
pub mod checks;
pub mod detector;
pub mod encoding;
pub mod error;
pub mod header;
pub mod loader;
pub mod package;
pub mod parsers;
pub mod registry;
pub mod report;
pub mod resource;
pub mod row;
pub mod validator;

pub use checklist::Checklist;
pub use checks::{Check, CheckDescriptor};
pub use detector::*;
pub use encoding::{DecodingReader, encode, lookup_encoding};
pub use error::*;
pub use header::Header;
pub use loader::{BufferLoader, ByteStats, ByteStream, FileLoader, Loader, Source};
pub use package::{ForeignKeyLookup, Package};
pub use parsers::{CellRow, CellRows, Parser, ParserInput};
pub use registry::Registry;
pub use report::*;
pub use resource::{OpenTable, TableResource};
pub use row::{Row, RowIntegrity};
pub use validator::*;
