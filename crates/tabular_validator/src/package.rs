//! Packages of resources and foreign key lookups between them.

use crate::detector::Detector;
use crate::registry::Registry;
use crate::resource::TableResource;
use crate::row::key_of;
use crate::{Result, TableError};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tabular_core::PackageDescriptor;
use tracing::debug;

/// Key sets of referenced resources, by resource name and field list.
///
/// Keys are tuples of [`Value::key`](tabular_core::Value::key) strings, so
/// the integer `1` and the string `"1"` resolve to the same key.
#[derive(Debug, Clone, Default)]
pub struct ForeignKeyLookup {
    tables: HashMap<String, HashMap<Vec<String>, HashSet<Vec<String>>>>,
}

impl ForeignKeyLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        resource: impl Into<String>,
        fields: Vec<String>,
        keys: HashSet<Vec<String>>,
    ) {
        self.tables
            .entry(resource.into())
            .or_default()
            .insert(fields, keys);
    }

    pub fn has(&self, resource: &str, fields: &[String]) -> bool {
        self.tables
            .get(resource)
            .is_some_and(|tables| tables.contains_key(fields))
    }

    /// Whether `key` exists for `fields` of `resource`; `None` when no such
    /// table was loaded.
    pub fn contains(&self, resource: &str, fields: &[String], key: &[String]) -> Option<bool> {
        let keys = self.tables.get(resource)?.get(fields)?;
        Some(keys.contains(key))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Reads every resource referenced by the declared foreign keys of
    /// `resource`. Self references read `resource` itself in a separate
    /// pass; other references are looked up in `package`.
    pub fn for_resource(resource: &TableResource, package: Option<&Package>) -> Result<Self> {
        let mut lookup = Self::new();
        let Some(schema) = &resource.descriptor().schema else {
            return Ok(lookup);
        };

        for key in &schema.foreign_keys {
            let fields = &key.reference.fields;
            let (name, source) = if key.is_self_reference() {
                (resource.name(), resource.clone())
            } else {
                let name = key.reference.resource.clone();
                let source = package.and_then(|package| package.get_resource(&name));
                let Some(source) = source else {
                    return Err(TableError::resource(format!(
                        "foreign key references unknown resource \"{name}\""
                    )));
                };
                (name, source)
            };
            if lookup.has(&name, fields) {
                continue;
            }

            debug!("Building lookup for {name} ({})", fields.join(", "));
            let keys = collect_keys(&source, fields).map_err(|error| {
                TableError::resource(format!(
                    "foreign key reference \"{name}\" cannot be read: {}",
                    error.note()
                ))
            })?;
            lookup.insert(name, fields.clone(), keys);
        }
        Ok(lookup)
    }
}

/// All complete keys of `fields` in `resource`.
fn collect_keys(resource: &TableResource, fields: &[String]) -> Result<HashSet<Vec<String>>> {
    let mut table = resource.open()?;
    let indexes = fields
        .iter()
        .map(|field| {
            table.schema().field_position(field).ok_or_else(|| {
                TableError::resource(format!("field \"{field}\" is not in the resource"))
            })
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut keys = HashSet::new();
    for row in table.rows() {
        if let Some(key) = key_of(&row?, &indexes) {
            keys.insert(key);
        }
    }
    Ok(keys)
}

/// A set of resources sharing a base path, detector and registry.
#[derive(Debug, Clone)]
pub struct Package {
    descriptor: PackageDescriptor,
    basepath: Option<PathBuf>,
    detector: Detector,
    registry: Registry,
    trusted: bool,
}

impl Package {
    pub fn new(descriptor: PackageDescriptor) -> Self {
        Self {
            descriptor,
            basepath: None,
            detector: Detector::default(),
            registry: Registry::default(),
            trusted: false,
        }
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

    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> Option<&str> {
        self.descriptor.name.as_deref()
    }

    pub fn has_foreign_keys(&self) -> bool {
        self.descriptor.has_foreign_keys()
    }

    pub fn validate(&self) -> Result<()> {
        self.descriptor
            .validate()
            .map_err(|error| TableError::package(error.to_string()))
    }

    /// Resources in declaration order, configured like the package.
    pub fn resources(&self) -> Vec<TableResource> {
        self.descriptor
            .resources
            .iter()
            .map(|descriptor| self.resource(descriptor.clone()))
            .collect()
    }

    pub fn get_resource(&self, name: &str) -> Option<TableResource> {
        self.descriptor
            .get_resource(name)
            .map(|descriptor| self.resource(descriptor.clone()))
    }

    fn resource(&self, descriptor: tabular_core::ResourceDescriptor) -> TableResource {
        let resource = TableResource::new(descriptor)
            .with_detector(self.detector.clone())
            .with_registry(self.registry.clone())
            .with_trusted(self.trusted);
        match &self.basepath {
            Some(basepath) => resource.with_basepath(basepath.clone()),
            None => resource,
        }
    }

    /// Infers every resource.
    pub fn infer(&self, stats: bool) -> Result<PackageDescriptor> {
        let mut descriptor = self.descriptor.clone();
        descriptor.resources = self
            .resources()
            .iter()
            .map(|resource| resource.infer(stats))
            .collect::<Result<_>>()?;
        Ok(descriptor)
    }
}
