pub mod check;
pub mod describe;
pub mod validate;

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use tabular_descriptor::{Descriptor, basepath, load_descriptor, load_schema, parse_file};
use tabular_validator::{Detector, Package, TableResource};
use tracing::debug;

/// How data is read and detected.
#[derive(Args, Debug, Clone, Default)]
pub struct ReadArgs {
    /// Schema descriptor to validate against instead of inferring one
    #[arg(long)]
    pub schema: Option<String>,

    /// Data format, overriding the file extension (csv, tsv, json, ndjson)
    #[arg(long)]
    pub format: Option<String>,

    /// Text encoding, overriding detection
    #[arg(long)]
    pub encoding: Option<String>,

    /// Row numbers of the header, comma separated (e.g. 1,2)
    #[arg(long, value_delimiter = ',')]
    pub header_rows: Vec<usize>,

    /// Rows sampled for dialect and schema detection
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// Share of sample values a type must match to be inferred
    #[arg(long)]
    pub field_confidence: Option<f64>,

    /// Match schema fields to header labels by name
    #[arg(long)]
    pub schema_sync: bool,
}

impl ReadArgs {
    pub fn detector(&self) -> Detector {
        let mut detector = Detector::new().with_schema_sync(self.schema_sync);
        if let Some(size) = self.sample_size {
            detector = detector.with_sample_size(size);
        }
        if let Some(confidence) = self.field_confidence {
            detector = detector.with_field_confidence(confidence);
        }
        detector
    }

    /// Applies the overrides to a single resource.
    fn configure(&self, mut resource: TableResource) -> Result<TableResource> {
        resource = resource.with_detector(self.detector());
        if let Some(path) = &self.schema {
            let schema = load_schema(Path::new(path))
                .with_context(|| format!("Failed to load schema: {}", path))?;
            resource = resource.with_schema(schema);
        }
        if let Some(format) = &self.format {
            resource = resource.with_format(format);
        }
        if let Some(encoding) = &self.encoding {
            resource = resource.with_encoding(encoding);
        }
        if !self.header_rows.is_empty() {
            let dialect = resource
                .descriptor()
                .dialect
                .clone()
                .unwrap_or_default()
                .with_header_rows(self.header_rows.clone());
            resource = resource.with_dialect(dialect);
        }
        Ok(resource)
    }
}

/// Options of the validate command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Stop a resource after this many errors
    #[arg(long)]
    pub limit_errors: Option<usize>,

    /// Stop a resource after this many rows
    #[arg(long)]
    pub limit_rows: Option<usize>,

    /// Validate package resources in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Only report these error codes or tags, comma separated
    #[arg(long, value_delimiter = ',')]
    pub pick_errors: Vec<String>,

    /// Never report these error codes or tags, comma separated
    #[arg(long, value_delimiter = ',')]
    pub skip_errors: Vec<String>,

    /// Checklist descriptor with extra checks (JSON, YAML or TOML)
    #[arg(long)]
    pub checklist: Option<String>,

    /// Read cells without inferring field types
    #[arg(long)]
    pub original: bool,
}

/// What a command operates on.
pub enum Target {
    Resource(TableResource),
    Package(Package),
}

/// Resolves `source` into a resource or package.
///
/// Descriptor files are read with paths relative to their directory; any
/// other path is read as data.
pub fn load_target(source: &str, args: &ReadArgs) -> Result<Target> {
    let path = Path::new(source);
    if !is_descriptor(path)? {
        debug!("Reading {} as data", source);
        return Ok(Target::Resource(args.configure(TableResource::from_path(path))?));
    }

    debug!("Reading {} as descriptor", source);
    let descriptor = load_descriptor(path)
        .with_context(|| format!("Failed to parse descriptor file: {}", source))?;
    Ok(match descriptor {
        Descriptor::Package(descriptor) => Target::Package(
            Package::new(descriptor)
                .with_basepath(basepath(path))
                .with_detector(args.detector()),
        ),
        Descriptor::Resource(descriptor) => Target::Resource(
            args.configure(TableResource::new(descriptor).with_basepath(basepath(path)))?,
        ),
    })
}

/// YAML and TOML files are always descriptors. A JSON file is a descriptor
/// when it is an object naming resources, a path or inline data; JSON tables
/// are data.
fn is_descriptor(path: &Path) -> Result<bool> {
    if !tabular_descriptor::is_descriptor_path(path) {
        return Ok(false);
    }
    let is_json = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    if !is_json {
        return Ok(true);
    }
    let value: serde_json::Value = parse_file(path)
        .with_context(|| format!("Failed to parse JSON file: {}", path.display()))?;
    Ok(["resources", "path", "data"]
        .iter()
        .any(|key| value.get(key).is_some()))
}
