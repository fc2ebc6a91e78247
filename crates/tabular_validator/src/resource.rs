//! Tabular resources and their read pipeline.
//!
//! Opening a [`TableResource`] runs the whole pipeline up to the first data
//! row:
//!
//! 1. the scheme's [`Loader`](crate::Loader) opens the raw byte stream
//! 2. raw bytes are counted and hashed (md5, sha256)
//! 3. gzip is streamed, zip is spooled to a temporary file
//! 4. the first `buffer_size` bytes are buffered for encoding detection
//!    and replayed
//! 5. the decoded text goes to the format's [`Parser`]
//! 6. `sample_size` rows are sampled for dialect and schema detection and
//!    replayed
//!
//! The resulting [`OpenTable`] yields typed [`Row`]s lazily, in a single
//! pass. Re-opening runs the pipeline again from the start.
//!
//! # Example
//!
//! ```rust
//! use tabular_validator::TableResource;
//! use serde_json::json;
//!
//! let resource = TableResource::from_data(vec![
//!     json!(["id", "name"]),
//!     json!([1, "english"]),
//!     json!([2, "中国人"]),
//! ]);
//! let mut table = resource.open().unwrap();
//! assert_eq!(table.header().labels(), &["id".to_string(), "name".to_string()]);
//! let rows: Vec<_> = table.rows().collect::<Result<_, _>>().unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0].row_number(), 2);
//! ```

use crate::detector::Detector;
use crate::encoding::{DecodingReader, lookup_encoding};
use crate::header::Header;
use crate::loader::{
    ByteCounter, ByteStats, ByteStream, HashingReader, Source, StageReader, buffer_prefix,
    decompress,
};
use crate::package::ForeignKeyLookup;
use crate::parsers::{CellRow, CellRows, Parser, ParserInput};
use crate::registry::Registry;
use crate::row::{Row, RowIntegrity};
use crate::{ErrorCode, Result, TableError};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabular_core::{
    Cell, CellReader, Dialect, ExpectedStats, ResourceDescriptor, Schema, is_safe_path,
};
use tracing::debug;

const COMPRESSIONS: [(&str, &str); 3] = [(".gz", "gz"), (".gzip", "gz"), (".zip", "zip")];

/// A resource whose data is read as a table.
#[derive(Debug, Clone)]
pub struct TableResource {
    descriptor: ResourceDescriptor,
    basepath: Option<PathBuf>,
    buffer: Option<Arc<[u8]>>,
    detector: Detector,
    registry: Registry,
    trusted: bool,
}

impl TableResource {
    /// A resource from a descriptor. Paths are resolved against the base
    /// path and must stay inside it unless the resource is trusted.
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        Self {
            descriptor,
            basepath: None,
            buffer: None,
            detector: Detector::default(),
            registry: Registry::default(),
            trusted: false,
        }
    }

    /// A resource for a path given directly by the caller; the path is
    /// trusted.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_string_lossy().into_owned();
        Self::new(ResourceDescriptor::from_path(path)).with_trusted(true)
    }

    /// A resource over inline rows (arrays or keyed objects).
    pub fn from_data(data: Vec<Cell>) -> Self {
        Self::new(ResourceDescriptor::from_data(data))
    }

    /// A resource over in-memory bytes of the given format.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>, format: impl Into<String>) -> Self {
        let mut descriptor = ResourceDescriptor::default().with_format(format);
        descriptor.scheme = Some("buffer".to_string());
        let mut resource = Self::new(descriptor);
        resource.buffer = Some(bytes.into());
        resource
    }

    pub fn with_basepath(mut self, basepath: impl Into<PathBuf>) -> Self {
        self.basepath = Some(basepath.into());
        self
    }

    pub fn with_detector(mut self, detector: Detector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_trusted(mut self, trusted: bool) -> Self {
        self.trusted = trusted;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.descriptor.schema = Some(schema);
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.descriptor.dialect = Some(dialect);
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.descriptor.encoding = Some(encoding.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.descriptor.format = Some(format.into());
        self
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn name(&self) -> String {
        self.descriptor.resolved_name()
    }

    pub fn place(&self) -> String {
        match &self.buffer {
            Some(_) => "<buffer>".to_string(),
            None => self.descriptor.place(),
        }
    }

    /// The declared scheme, or `buffer`, `inline`, the URL scheme of the
    /// path, or `file`.
    pub fn scheme(&self) -> String {
        if let Some(scheme) = &self.descriptor.scheme {
            return scheme.clone();
        }
        if self.buffer.is_some() {
            return "buffer".to_string();
        }
        match &self.descriptor.path {
            None => "inline".to_string(),
            Some(path) => match path.split_once("://") {
                Some((scheme, _)) => scheme.to_lowercase(),
                None => "file".to_string(),
            },
        }
    }

    /// The declared format, or the path extension without a compression
    /// suffix; inline data is `inline`, anything else `csv`.
    pub fn format(&self) -> String {
        if let Some(format) = &self.descriptor.format {
            return format.to_lowercase();
        }
        if self.descriptor.data.is_some() {
            return "inline".to_string();
        }
        let Some(path) = &self.descriptor.path else {
            return "csv".to_string();
        };
        let path = path.to_lowercase();
        let mut file = path.rsplit(['/', '\\']).next().unwrap_or(&path);
        if let Some((suffix, _)) = COMPRESSIONS.iter().find(|(suffix, _)| file.ends_with(suffix)) {
            file = &file[..file.len() - suffix.len()];
        }
        match file.rsplit_once('.') {
            Some((_, extension)) if !extension.is_empty() => extension.to_string(),
            _ => "csv".to_string(),
        }
    }

    /// The declared compression, or the one implied by the path suffix.
    pub fn compression(&self) -> Option<String> {
        if let Some(compression) = &self.descriptor.compression {
            return Some(compression.clone());
        }
        let path = self.descriptor.path.as_ref()?.to_lowercase();
        COMPRESSIONS
            .iter()
            .find(|(suffix, _)| path.ends_with(suffix))
            .map(|(_, compression)| compression.to_string())
    }

    fn validate(&self) -> Result<()> {
        if self.buffer.is_none() {
            return Ok(self.descriptor.validate()?);
        }
        if let Some(dialect) = &self.descriptor.dialect {
            dialect.validate()?;
        }
        if let Some(schema) = &self.descriptor.schema {
            schema.validate()?;
        }
        Ok(())
    }

    fn source(&self) -> Result<Source> {
        if let Some(buffer) = &self.buffer {
            return Ok(Source::Buffer(Arc::clone(buffer)));
        }
        let Some(path) = &self.descriptor.path else {
            return Err(TableError::resource("resource must provide a path or inline data"));
        };
        if !self.trusted && !is_safe_path(path) {
            return Err(TableError::resource(format!(
                "path \"{path}\" is not safe"
            )));
        }
        Ok(Source::Path(match &self.basepath {
            Some(basepath) => basepath.join(path),
            None => PathBuf::from(path),
        }))
    }

    /// Runs the read pipeline up to the first data row.
    pub fn open(&self) -> Result<OpenTable> {
        self.validate()?;
        let format = self.format();
        let parser = self.registry.parser(&format)?;
        debug!("Opening resource {} as {format}", self.name());

        let mut parse_dialect = self.descriptor.dialect.clone().unwrap_or_default();
        if parse_dialect.keys.is_none()
            && let Some(schema) = &self.descriptor.schema
        {
            parse_dialect.keys = Some(schema.fields.iter().map(|field| field.name.clone()).collect());
        }

        let counter = ByteCounter::new();
        let (mut cell_rows, encoding) = if parser.requires_loader() {
            let (stream, encoding) = self.open_text(&counter, parser.as_ref(), &mut parse_dialect)?;
            let rows = parser.read_cell_rows(ParserInput::Text(stream), &parse_dialect)?;
            (rows, Some(encoding))
        } else {
            let data = self.descriptor.data.clone().unwrap_or_default();
            let rows = parser.read_cell_rows(ParserInput::Data(data), &parse_dialect)?;
            (rows, None)
        };

        let sample_limit = self.detector.sample_size.max(1) + parse_dialect.header_last_row().max(1);
        let mut sample: Vec<CellRow> = Vec::new();
        for cells in cell_rows.by_ref().take(sample_limit) {
            sample.push(cells?);
        }

        let mut dialect = self
            .detector
            .detect_dialect(&sample, self.descriptor.dialect.as_ref());
        dialect.delimiter = parse_dialect.delimiter.clone();
        dialect.keys = parse_dialect.keys.clone();

        let labels = dialect.read_labels(&sample);
        let (fragment, _) = dialect.read_fragment(&sample);
        let detection = self.detector.detect_schema(
            &fragment,
            &labels,
            self.descriptor.schema.as_ref(),
            &dialect,
        )?;
        let schema = detection.schema;
        schema.validate()?;

        let row_numbers = if dialect.header {
            dialect.header_rows.clone()
        } else {
            Vec::new()
        };
        let header = Header::new(
            labels,
            &schema,
            row_numbers,
            &detection.synthesized,
            !dialect.header_case,
        );

        // fields appended for missing labels during sync are not read from rows
        let row_fields = if self.detector.schema_sync && !header.missing() {
            header.labels().len().min(schema.fields.len())
        } else {
            schema.fields.len()
        };
        let readers: Vec<CellReader> = schema.cell_readers().into_iter().take(row_fields).collect();
        let field_names: Arc<[String]> = readers.iter().map(|reader| reader.field().name.clone()).collect();
        let integrity = RowIntegrity::new(&schema, &field_names, &self.name(), None);

        Ok(OpenTable {
            name: self.name(),
            place: self.place(),
            scheme: self.scheme(),
            format,
            compression: self.compression(),
            encoding,
            dialect,
            schema,
            header,
            sample: sample.into_iter().collect(),
            cell_rows: Some(cell_rows),
            counter,
            readers,
            field_names,
            integrity,
            physical: 0,
            rows: 0,
            exhausted: false,
        })
    }

    fn open_text(
        &self,
        counter: &ByteCounter,
        parser: &dyn Parser,
        dialect: &mut Dialect,
    ) -> Result<(ByteStream, String)> {
        let loader = self.registry.loader(&self.scheme())?;
        let raw = loader.open(&self.source()?)?;
        let raw: ByteStream = Box::new(HashingReader::new(
            StageReader::new(raw, ErrorCode::SchemeError),
            counter.clone(),
        ));
        let stream = decompress(
            raw,
            self.compression().as_deref(),
            self.descriptor.innerpath.as_deref(),
        )?;
        let (buffer, stream) = buffer_prefix(stream, self.detector.buffer_size)?;

        let label = match &self.descriptor.encoding {
            Some(encoding) => encoding.clone(),
            None => self.detector.detect_encoding(&buffer),
        };
        let encoding = lookup_encoding(&label)?;
        debug!("Decoding {} as {label}", self.name());

        let (text, _) = encoding.decode_with_bom_removal(&buffer);
        parser.infer_dialect(&text, dialect);

        Ok((Box::new(DecodingReader::new(stream, encoding)), label))
    }

    /// Describes the resource: detected scheme, format, compression,
    /// encoding, dialect and schema. With `stats`, the data is read through
    /// to add hash, byte count, field count and row count.
    pub fn infer(&self, stats: bool) -> Result<ResourceDescriptor> {
        let mut table = self.open()?;
        let mut descriptor = self.descriptor.clone();
        descriptor.name = Some(self.name());
        descriptor.scheme = Some(table.scheme.clone());
        descriptor.format = Some(table.format.clone());
        descriptor.compression = table.compression.clone();
        descriptor.encoding = table.encoding.clone();
        descriptor.dialect = Some(table.dialect.clone());
        descriptor.schema = Some(table.schema.clone());

        if stats {
            for row in table.rows() {
                row?;
            }
            let bytes = table.byte_stats();
            if descriptor.data.is_none() {
                descriptor.hash = bytes.sha256.map(|hash| format!("sha256:{hash}"));
                descriptor.bytes = Some(bytes.bytes);
            }
            descriptor.stats = Some(ExpectedStats {
                fields: Some(table.schema.fields.len()),
                rows: Some(table.row_count()),
            });
        }
        Ok(descriptor)
    }

    /// Opens the resource and reads all rows.
    pub fn read_rows(&self) -> Result<Vec<Row>> {
        self.open()?.rows().collect()
    }
}

/// An opened resource: detected metadata plus the lazy row stream.
pub struct OpenTable {
    name: String,
    place: String,
    scheme: String,
    format: String,
    compression: Option<String>,
    encoding: Option<String>,
    dialect: Dialect,
    schema: Schema,
    header: Header,
    sample: VecDeque<CellRow>,
    cell_rows: Option<CellRows>,
    counter: ByteCounter,
    readers: Vec<CellReader>,
    field_names: Arc<[String]>,
    integrity: RowIntegrity,
    physical: usize,
    rows: usize,
    exhausted: bool,
}

impl OpenTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn place(&self) -> &str {
        &self.place
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn compression(&self) -> Option<&str> {
        self.compression.as_deref()
    }

    /// Encoding label used to decode the bytes; `None` for inline data.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn labels(&self) -> &[String] {
        self.header.labels()
    }

    /// Raw rows sampled for detection that have not been streamed yet.
    pub fn sample(&self) -> impl Iterator<Item = &CellRow> {
        self.sample.iter()
    }

    /// Data rows emitted so far.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Byte count and digests; final once the stream is exhausted.
    pub fn byte_stats(&self) -> ByteStats {
        if self.exhausted {
            self.counter.finish()
        } else {
            self.counter.snapshot()
        }
    }

    /// Enables foreign key checks against `lookup`. Must be called before
    /// reading rows.
    pub fn set_lookup(&mut self, lookup: Arc<ForeignKeyLookup>) {
        self.integrity = RowIntegrity::new(&self.schema, &self.field_names, &self.name, Some(lookup));
    }

    /// The lazy row stream. An `Err` is fatal and ends the stream.
    pub fn rows(&mut self) -> impl Iterator<Item = Result<Row>> + '_ {
        std::iter::from_fn(move || self.next_row())
    }

    fn next_cells(&mut self) -> Option<Result<CellRow>> {
        if let Some(cells) = self.sample.pop_front() {
            return Some(Ok(cells));
        }
        self.cell_rows.as_mut()?.next()
    }

    fn next_row(&mut self) -> Option<Result<Row>> {
        if self.exhausted {
            return None;
        }
        loop {
            let cells = match self.next_cells() {
                Some(Ok(cells)) => cells,
                Some(Err(error)) => {
                    self.close();
                    return Some(Err(error));
                }
                None => {
                    self.close();
                    self.counter.finish();
                    return None;
                }
            };
            self.physical += 1;
            if self.skips(self.physical, &cells) {
                continue;
            }

            let mut row = Row::new(cells, &self.readers, Arc::clone(&self.field_names), self.physical);
            if self.integrity.is_active() && !row.is_blank() {
                self.integrity.check(&mut row);
            }
            self.rows += 1;
            return Some(Ok(row));
        }
    }

    fn skips(&self, row_number: usize, cells: &[Cell]) -> bool {
        let dialect = &self.dialect;
        if dialect.header {
            let first = dialect.header_rows.iter().copied().min().unwrap_or(1);
            if row_number < first || dialect.header_rows.contains(&row_number) {
                return true;
            }
        }
        dialect.is_comment_row(row_number, cells)
    }

    /// Drops the underlying streams; safe at any point.
    pub fn close(&mut self) {
        self.exhausted = true;
        self.sample.clear();
        self.cell_rows = None;
    }
}

impl std::fmt::Debug for OpenTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenTable")
            .field("name", &self.name)
            .field("place", &self.place)
            .field("format", &self.format)
            .field("encoding", &self.encoding)
            .field("rows", &self.rows)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
