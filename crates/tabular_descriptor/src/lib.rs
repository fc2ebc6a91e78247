//! Descriptor I/O for tabular resources (JSON/YAML/TOML formats).
//!
//! This crate reads schema, resource and package descriptors from strings or
//! files into the strongly-typed structures of `tabular_core`, and writes
//! them back.
//!
//! # Example
//!
//! ```rust
//! use tabular_descriptor::parse_yaml;
//! use tabular_core::Schema;
//!
//! let yaml = r#"
//! fields:
//!   - name: id
//!     type: integer
//!   - name: name
//!     type: string
//! primaryKey: id
//! "#;
//!
//! let schema: Schema = parse_yaml(yaml).expect("Failed to parse schema");
//! assert_eq!(schema.field_names(), vec!["id", "name"]);
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tabular_core::{PackageDescriptor, ResourceDescriptor, Schema};
use thiserror::Error;

/// Errors that can occur during descriptor I/O.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// JSON parsing or deserialization failed
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,
}

/// Result type alias for descriptor operations.
pub type Result<T> = std::result::Result<T, DescriptorError>;

/// Supported descriptor file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
}

/// A descriptor file holding either a single resource or a package.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Resource(ResourceDescriptor),
    Package(PackageDescriptor),
}

/// Parse a descriptor from a JSON string.
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(serde_json::from_str(content)?)
}

/// Parse a descriptor from a YAML string.
pub fn parse_yaml<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(serde_yaml_ng::from_str(content)?)
}

/// Parse a descriptor from a TOML string.
///
/// # Example
///
/// ```rust
/// use tabular_descriptor::parse_toml;
/// use tabular_core::ResourceDescriptor;
///
/// let toml = r#"
/// path = "data/table.csv"
///
/// [[schema.fields]]
/// name = "id"
/// type = "integer"
/// "#;
///
/// let resource: ResourceDescriptor = parse_toml(toml).unwrap();
/// assert_eq!(resource.resolved_name(), "table");
/// ```
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| DescriptorError::TomlError(e.to_string()))
}

/// Parse a descriptor string in the given format.
pub fn parse_str<T: DeserializeOwned>(content: &str, format: DescriptorFormat) -> Result<T> {
    match format {
        DescriptorFormat::Json => parse_json(content),
        DescriptorFormat::Yaml => parse_yaml(content),
        DescriptorFormat::Toml => parse_toml(content),
    }
}

/// Detect the descriptor format from a file path based on its extension.
///
/// # Supported Extensions
///
/// * `.json` → `DescriptorFormat::Json`
/// * `.yaml`, `.yml` → `DescriptorFormat::Yaml`
/// * `.toml` → `DescriptorFormat::Toml`
///
/// # Errors
///
/// Returns `DescriptorError::InvalidExtension` if the file has no extension.
/// Returns `DescriptorError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<DescriptorFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(DescriptorError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "json" => Ok(DescriptorFormat::Json),
        "yaml" | "yml" => Ok(DescriptorFormat::Yaml),
        "toml" => Ok(DescriptorFormat::Toml),
        other => Err(DescriptorError::UnsupportedFormat(other.to_string())),
    }
}

/// Whether a path looks like a descriptor file rather than data.
pub fn is_descriptor_path(path: &Path) -> bool {
    detect_format(path).is_ok()
}

/// Parse a descriptor from a file with automatic format detection.
pub fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_str(&content, format)
}

/// Serialize a descriptor in the given format.
pub fn to_string<T: Serialize>(descriptor: &T, format: DescriptorFormat) -> Result<String> {
    match format {
        DescriptorFormat::Json => Ok(serde_json::to_string_pretty(descriptor)?),
        DescriptorFormat::Yaml => Ok(serde_yaml_ng::to_string(descriptor)?),
        DescriptorFormat::Toml => {
            toml::to_string(descriptor).map_err(|e| DescriptorError::TomlError(e.to_string()))
        }
    }
}

/// Directory relative resource paths are resolved against.
pub fn basepath(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Load a schema descriptor file.
pub fn load_schema(path: &Path) -> Result<Schema> {
    parse_file(path)
}

/// Load a resource descriptor file.
pub fn load_resource(path: &Path) -> Result<ResourceDescriptor> {
    parse_file(path)
}

/// Load a package descriptor file.
pub fn load_package(path: &Path) -> Result<PackageDescriptor> {
    parse_file(path)
}

/// Load a descriptor file, telling packages (with `resources`) from
/// resources.
pub fn load_descriptor(path: &Path) -> Result<Descriptor> {
    let value: serde_json::Value = parse_file(path)?;
    if value.get("resources").is_some() {
        Ok(Descriptor::Package(serde_json::from_value(value)?))
    } else {
        Ok(Descriptor::Resource(serde_json::from_value(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tabular_core::FieldType;

    #[test]
    fn test_parse_yaml_schema() {
        let yaml = r#"
fields:
  - name: id
    type: integer
    constraints:
      required: true
  - name: price
    type: number
    decimalChar: ","
missingValues: ["", "NA"]
primaryKey: [id]
"#;
        let schema: Schema = parse_yaml(yaml).expect("Failed to parse YAML schema");
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].field_type, FieldType::Integer);
        assert!(schema.fields[0].required());
        assert_eq!(schema.fields[1].decimal_char(), ",");
        assert_eq!(schema.missing_values, vec!["", "NA"]);
        assert_eq!(schema.primary_key, vec!["id"]);
    }

    #[test]
    fn test_parse_json_package() {
        let json = r#"{
            "name": "pkg",
            "resources": [
                {"name": "a", "path": "a.csv"},
                {"name": "b", "data": [["id"], [1]]}
            ]
        }"#;
        let package: PackageDescriptor = parse_json(json).unwrap();
        assert_eq!(package.resources.len(), 2);
        assert_eq!(package.resources[1].data.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result: Result<Schema> = parse_yaml("fields: [");
        assert!(matches!(result, Err(DescriptorError::YamlError(_))));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result: Result<Schema> = parse_toml("fields = [");
        assert!(matches!(result, Err(DescriptorError::TomlError(_))));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), DescriptorFormat::Json);
        assert_eq!(detect_format(Path::new("a.YML")).unwrap(), DescriptorFormat::Yaml);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), DescriptorFormat::Toml);
        assert!(matches!(
            detect_format(Path::new("a.csv")),
            Err(DescriptorError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            detect_format(Path::new("a")),
            Err(DescriptorError::InvalidExtension)
        ));
        assert!(!is_descriptor_path(Path::new("data.csv")));
    }

    #[test]
    fn test_load_descriptor_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datapackage.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"resources": [{{"path": "table.csv"}}]}}"#).unwrap();
        assert!(matches!(load_descriptor(&path).unwrap(), Descriptor::Package(_)));
        assert_eq!(basepath(&path), dir.path());

        let path = dir.path().join("resource.yaml");
        std::fs::write(&path, "path: table.csv\n").unwrap();
        assert!(matches!(load_descriptor(&path).unwrap(), Descriptor::Resource(_)));
    }

    #[test]
    fn test_to_string_round_trip() {
        let schema: Schema = parse_json(r#"{"fields": [{"name": "id", "type": "integer"}]}"#).unwrap();
        for format in [DescriptorFormat::Json, DescriptorFormat::Yaml, DescriptorFormat::Toml] {
            let text = to_string(&schema, format).unwrap();
            let parsed: Schema = parse_str(&text, format).unwrap();
            assert_eq!(parsed, schema);
        }
    }
}
