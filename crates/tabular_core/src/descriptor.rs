//! Resource and package descriptors.
//!
//! Descriptors are plain serde structures; reading them from JSON, YAML or
//! TOML files is done by `tabular_descriptor`.

use crate::{Cell, CoreError, Dialect, Result, Schema};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Expected statistics of a resource, compared after reading it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
}

/// A tabular data resource: where the data is and how to read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Local path (relative to the descriptor) or URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Inline rows: arrays of cells or keyed objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Cell>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,

    /// Member of a zip archive to read (first file by default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub innerpath: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<Dialect>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    /// Expected hash, optionally prefixed by its algorithm (`sha256:...`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Expected byte count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ExpectedStats>,
}

impl ResourceDescriptor {
    /// A resource read from a path.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// A resource holding its rows inline.
    pub fn from_data(data: Vec<Cell>) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    /// Sets the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Sets the format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Name, falling back to the file stem of the path.
    pub fn resolved_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.path
            .as_deref()
            .map(detect_name)
            .unwrap_or_else(|| "memory".to_string())
    }

    /// Where the data comes from, for reports.
    pub fn place(&self) -> String {
        match &self.path {
            Some(path) => match &self.innerpath {
                Some(inner) => format!("{path} -> {inner}"),
                None => path.clone(),
            },
            None => "<memory>".to_string(),
        }
    }

    /// Whether the schema declares foreign keys.
    pub fn has_foreign_keys(&self) -> bool {
        self.schema
            .as_ref()
            .is_some_and(|schema| !schema.foreign_keys.is_empty())
    }

    /// Problems with the resource descriptor.
    pub fn validate(&self) -> Result<()> {
        if self.path.is_none() && self.data.is_none() {
            return Err(CoreError::InvalidDescriptor(
                "resource must provide a path or inline data".to_string(),
            ));
        }
        if self.path.is_some() && self.data.is_some() {
            return Err(CoreError::InvalidDescriptor(
                "resource cannot provide both a path and inline data".to_string(),
            ));
        }
        if let Some(dialect) = &self.dialect {
            dialect.validate()?;
        }
        if let Some(schema) = &self.schema {
            schema.validate()?;
        }
        Ok(())
    }
}

/// Lowercased file stem of a path, with compression suffixes removed.
pub fn detect_name(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let file = file.split(['?', '#']).next().unwrap_or(file);
    let stem = file
        .split_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file);
    let name: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    if name.is_empty() {
        "memory".to_string()
    } else {
        name
    }
}

/// Whether a path stays inside its base directory.
pub fn is_safe_path(path: &str) -> bool {
    let candidate = Path::new(path);
    !candidate.is_absolute()
        && !path.starts_with('~')
        && !candidate
            .components()
            .any(|component| matches!(component, std::path::Component::ParentDir))
}

/// A collection of resources validated together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
}

impl PackageDescriptor {
    pub fn new(resources: Vec<ResourceDescriptor>) -> Self {
        Self {
            resources,
            ..Default::default()
        }
    }

    /// Resource by (resolved) name.
    pub fn get_resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources
            .iter()
            .find(|resource| resource.resolved_name() == name)
    }

    /// Whether any resource declares foreign keys.
    pub fn has_foreign_keys(&self) -> bool {
        self.resources.iter().any(ResourceDescriptor::has_foreign_keys)
    }

    /// Problems with the package descriptor (resources are validated when
    /// they are opened).
    pub fn validate(&self) -> Result<()> {
        if self.resources.is_empty() {
            return Err(CoreError::InvalidDescriptor(
                "package must contain at least one resource".to_string(),
            ));
        }
        let mut names = std::collections::HashSet::new();
        for resource in &self.resources {
            let name = resource.resolved_name();
            if !names.insert(name.clone()) {
                return Err(CoreError::InvalidDescriptor(format!(
                    "resource name \"{name}\" is not unique"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_detect_name() {
        assert_eq!(detect_name("data/table.csv"), "table");
        assert_eq!(detect_name("data/Table Data.csv.gz"), "table-data");
        assert_eq!(detect_name("https://example.com/path/file.csv?x=1"), "file");
    }

    #[test]
    fn test_safe_paths() {
        assert!(is_safe_path("data/table.csv"));
        assert!(!is_safe_path("../table.csv"));
        assert!(!is_safe_path("/etc/passwd"));
        assert!(!is_safe_path("~/table.csv"));
    }

    #[test]
    fn test_resource_descriptor() {
        let resource: ResourceDescriptor = serde_json::from_value(json!({
            "path": "data/table.csv",
            "schema": {"fields": [{"name": "id", "type": "integer"}]},
            "stats": {"rows": 2}
        }))
        .unwrap();
        assert_eq!(resource.resolved_name(), "table");
        assert_eq!(resource.place(), "data/table.csv");
        assert_eq!(resource.stats.as_ref().and_then(|s| s.rows), Some(2));
        assert!(resource.validate().is_ok());
        assert!(!resource.has_foreign_keys());

        assert!(ResourceDescriptor::default().validate().is_err());
        let inline = ResourceDescriptor::from_data(vec![json!(["id"])]);
        assert_eq!(inline.resolved_name(), "memory");
        assert_eq!(inline.place(), "<memory>");
    }

    #[test]
    fn test_package_names_are_unique() {
        let package = PackageDescriptor::new(vec![
            ResourceDescriptor::from_path("a/table.csv"),
            ResourceDescriptor::from_path("b/table.csv"),
        ]);
        assert!(package.validate().is_err());
        let package = PackageDescriptor::new(vec![
            ResourceDescriptor::from_path("a/table.csv"),
            ResourceDescriptor::from_path("b/table.csv").with_name("other"),
        ]);
        assert!(package.validate().is_ok());
        assert!(package.get_resource("other").is_some());
    }
}
