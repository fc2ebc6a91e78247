//! Builder pattern for creating schemas.
//!
//! This module provides ergonomic builders for constructing schemas and
//! their fields with a fluent API.

use crate::{Cell, Constraints, Field, FieldType, ForeignKey, ForeignKeyReference, Schema};

/// Builder for creating a `Schema`.
///
/// # Example
///
/// ```rust
/// use tabular_core::{FieldBuilder, FieldType, SchemaBuilder};
///
/// let schema = SchemaBuilder::new()
///     .field(FieldBuilder::new("id", FieldType::Integer).required(true).build())
///     .field(FieldBuilder::new("name", FieldType::String).build())
///     .primary_key(["id"])
///     .build();
///
/// assert_eq!(schema.field_names(), vec!["id", "name"]);
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
    missing_values: Option<Vec<String>>,
    primary_key: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the schema.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds multiple fields to the schema.
    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Sets the missing values.
    pub fn missing_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the primary key.
    pub fn primary_key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = names.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a foreign key. An empty `resource` references the same resource.
    pub fn foreign_key<I, J, S, T>(mut self, fields: I, resource: impl Into<String>, reference: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        self.foreign_keys.push(ForeignKey {
            fields: fields.into_iter().map(Into::into).collect(),
            reference: ForeignKeyReference {
                resource: resource.into(),
                fields: reference.into_iter().map(Into::into).collect(),
            },
        });
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        let mut schema = Schema::new();
        schema.fields = self.fields;
        if let Some(missing_values) = self.missing_values {
            schema.missing_values = missing_values;
        }
        schema.primary_key = self.primary_key;
        schema.foreign_keys = self.foreign_keys;
        schema
    }
}

/// Builder for creating a `Field`.
///
/// # Example
///
/// ```rust
/// use tabular_core::{FieldBuilder, FieldType};
///
/// let field = FieldBuilder::new("price", FieldType::Number)
///     .decimal_char(",")
///     .group_char(".")
///     .minimum(0)
///     .build();
///
/// assert_eq!(field.decimal_char(), ",");
/// ```
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: Field::new(name, field_type),
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.field.format = format.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.field.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.field.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.field.constraints.required = required;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.field.constraints.unique = unique;
        self
    }

    pub fn min_length(mut self, length: usize) -> Self {
        self.field.constraints.min_length = Some(length);
        self
    }

    pub fn max_length(mut self, length: usize) -> Self {
        self.field.constraints.max_length = Some(length);
        self
    }

    pub fn minimum(mut self, minimum: impl Into<Cell>) -> Self {
        self.field.constraints.minimum = Some(minimum.into());
        self
    }

    pub fn maximum(mut self, maximum: impl Into<Cell>) -> Self {
        self.field.constraints.maximum = Some(maximum.into());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.field.constraints.pattern = Some(pattern.into());
        self
    }

    pub fn enum_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Cell>,
    {
        self.field.constraints.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces all constraints at once.
    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.field.constraints = constraints;
        self
    }

    pub fn missing_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field.missing_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn true_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field.true_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn false_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field.false_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn bare_number(mut self, bare: bool) -> Self {
        self.field.bare_number = Some(bare);
        self
    }

    pub fn float_number(mut self, float: bool) -> Self {
        self.field.float_number = Some(float);
        self
    }

    pub fn decimal_char(mut self, decimal_char: impl Into<String>) -> Self {
        self.field.decimal_char = Some(decimal_char.into());
        self
    }

    pub fn group_char(mut self, group_char: impl Into<String>) -> Self {
        self.field.group_char = Some(group_char.into());
        self
    }

    pub fn array_item(mut self, item: Field) -> Self {
        self.field.array_item = Some(Box::new(item));
        self
    }

    pub fn build(self) -> Field {
        self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_schema_builder() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("id", FieldType::Integer).build())
            .field(FieldBuilder::new("parent", FieldType::Integer).build())
            .missing_values(["", "NA"])
            .primary_key(["id"])
            .foreign_key(["parent"], "", ["id"])
            .build();

        assert_eq!(schema.missing_values, vec!["", "NA"]);
        assert_eq!(schema.primary_key, vec!["id"]);
        assert!(schema.foreign_keys[0].is_self_reference());
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_field_builder_matches_descriptor() {
        let built = FieldBuilder::new("code", FieldType::String)
            .required(true)
            .pattern("[A-Z]{3}")
            .enum_values(["ABC", "XYZ"])
            .build();
        let parsed: Field = serde_json::from_value(json!({
            "name": "code",
            "type": "string",
            "format": "default",
            "constraints": {"required": true, "pattern": "[A-Z]{3}", "enum": ["ABC", "XYZ"]}
        }))
        .unwrap();
        assert_eq!(built, parsed);
    }
}
