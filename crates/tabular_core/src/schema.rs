//! Table schema: ordered fields, keys and missing values.

use crate::field::DEFAULT_MISSING_VALUES;
use crate::{Cell, CellReader, CoreError, Field, Notes, Result, Value};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Map;
use std::collections::HashSet;

fn default_missing_values() -> Vec<String> {
    DEFAULT_MISSING_VALUES.iter().map(|v| v.to_string()).collect()
}

/// Accepts `"id"` as well as `["id", "name"]` for key field lists.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}

/// Schema definition for a tabular resource.
///
/// Field order is significant: fields map to column positions unless the
/// schema is synced to the header by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<Field>,

    /// Raw strings read as `None` before casting
    #[serde(default = "default_missing_values")]
    pub missing_values: Vec<String>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub primary_key: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

/// A foreign key: local fields referencing fields of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    #[serde(deserialize_with = "one_or_many")]
    pub fields: Vec<String>,
    pub reference: ForeignKeyReference,
}

/// Target of a foreign key. An empty resource name references the resource
/// that declares the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    #[serde(default)]
    pub resource: String,
    #[serde(deserialize_with = "one_or_many")]
    pub fields: Vec<String>,
}

impl ForeignKey {
    pub fn is_self_reference(&self) -> bool {
        self.reference.resource.is_empty()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Creates an empty schema with the default missing values.
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            missing_values: default_missing_values(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Builds a schema from a descriptor, validating it.
    pub fn from_descriptor(descriptor: Cell) -> Result<Self> {
        let schema: Schema = serde_json::from_value(descriptor)
            .map_err(|error| CoreError::schema(error.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Serializes the schema back to a descriptor.
    pub fn to_descriptor(&self) -> Cell {
        serde_json::to_value(self).unwrap_or_default()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Position of a field by name.
    pub fn field_position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Problems with the schema descriptor, including its fields.
    pub fn metadata_errors(&self) -> Vec<CoreError> {
        let mut errors: Vec<CoreError> = self
            .fields
            .iter()
            .flat_map(|field| field.metadata_errors())
            .collect();

        let mut seen = HashSet::new();
        for name in self.field_names() {
            if !seen.insert(name) {
                errors.push(CoreError::schema(format!("duplicate field name \"{name}\"")));
            }
        }

        for name in &self.primary_key {
            if !self.has_field(name) {
                errors.push(CoreError::schema(format!(
                    "primary key \"{name}\" does not match the fields \"{}\"",
                    self.field_names().join(", ")
                )));
            }
        }

        for key in &self.foreign_keys {
            for name in &key.fields {
                if !self.has_field(name) {
                    errors.push(CoreError::schema(format!(
                        "foreign key \"{name}\" does not match the fields \"{}\"",
                        self.field_names().join(", ")
                    )));
                }
            }
            if key.fields.len() != key.reference.fields.len() {
                errors.push(CoreError::schema(format!(
                    "foreign key fields \"{}\" does not match the reference fields \"{}\"",
                    key.fields.join(", "),
                    key.reference.fields.join(", ")
                )));
            }
        }

        errors
    }

    /// Fails with the first metadata error, if any.
    pub fn validate(&self) -> Result<()> {
        match self.metadata_errors().into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Compiled readers, one per field, in field order.
    pub fn cell_readers(&self) -> Vec<CellReader> {
        self.fields
            .iter()
            .map(|field| field.cell_reader(Some(&self.missing_values)))
            .collect()
    }

    /// Casts a row of cells positionally, one result per field.
    pub fn read_cells(&self, cells: &[Cell]) -> Vec<(Option<Value>, Option<Notes>)> {
        self.cell_readers()
            .iter()
            .enumerate()
            .map(|(index, reader)| reader.read(cells.get(index).unwrap_or(&Cell::Null)))
            .collect()
    }

    /// Serializes typed values positionally.
    pub fn write_cells(&self, values: &[Option<Value>]) -> Vec<(Option<String>, Option<Notes>)> {
        self.fields
            .iter()
            .zip(values)
            .map(|(field, value)| field.write_cell(value.as_ref()))
            .collect()
    }

    /// Deep-merges a partial descriptor onto this schema.
    ///
    /// Top-level keys are merged recursively; `fields` is a map from field
    /// name to a partial field descriptor merged onto that field.
    pub fn patch(&self, patch: &Cell) -> Result<Schema> {
        let mut descriptor = self.to_descriptor();
        let Cell::Object(patch) = patch else {
            return Err(CoreError::schema("schema patch must be an object"));
        };

        for (key, value) in patch {
            if key == "fields" {
                let Cell::Object(field_patches) = value else {
                    return Err(CoreError::schema(
                        "schema patch \"fields\" must map field names to patches",
                    ));
                };
                if let Some(Cell::Array(fields)) = descriptor.get_mut("fields") {
                    for field in fields.iter_mut() {
                        let name = field.get("name").and_then(Cell::as_str).map(str::to_string);
                        if let Some(field_patch) = name.and_then(|name| field_patches.get(&name)) {
                            merge(field, field_patch);
                        }
                    }
                }
            } else if let Cell::Object(target) = &mut descriptor {
                match target.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }

        Schema::from_descriptor(descriptor)
    }
}

/// Recursive merge of JSON objects; non-objects are replaced.
pub fn merge(target: &mut Cell, patch: &Cell) {
    match (target, patch) {
        (Cell::Object(target), Cell::Object(patch)) => merge_maps(target, patch),
        (target, patch) => *target = patch.clone(),
    }
}

fn merge_maps(target: &mut Map<String, Cell>, patch: &Map<String, Cell>) {
    for (key, value) in patch {
        match target.get_mut(key) {
            Some(existing) => merge(existing, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
