//! Typed, error-annotated rows and the integrity indexes run over them.

use crate::package::ForeignKeyLookup;
use crate::{ErrorCode, TableError};
use serde_json::Map;
use std::collections::HashMap;
use std::sync::Arc;
use tabular_core::{Cell, CellReader, Schema, TYPE_NOTE, Value, stringify_cell};

/// One data row cast against the schema.
///
/// Row numbers are physical: the header is row 1 in a typical table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
    field_names: Arc<[String]>,
    values: Vec<Option<Value>>,
    row_number: usize,
    blank_cells: Vec<usize>,
    error_cells: Vec<usize>,
    errors: Vec<TableError>,
}

impl Row {
    /// Casts `cells` positionally with one reader per field.
    pub fn new(
        cells: Vec<Cell>,
        readers: &[CellReader],
        field_names: Arc<[String]>,
        row_number: usize,
    ) -> Self {
        let mut cached: Option<Vec<String>> = None;
        let mut texts = || {
            cached
                .get_or_insert_with(|| cells.iter().map(stringify_cell).collect())
                .clone()
        };

        let mut values = Vec::with_capacity(readers.len());
        let mut blank_cells = Vec::new();
        let mut error_cells = Vec::new();
        let mut errors = Vec::new();

        for (index, reader) in readers.iter().enumerate() {
            let name = &reader.field().name;
            let Some(cell) = cells.get(index) else {
                // a missing trailing cell is reported once, as missing-cell
                values.push(None);
                blank_cells.push(index);
                errors.push(TableError::cell(
                    ErrorCode::MissingCell,
                    "",
                    texts(),
                    row_number,
                    "",
                    name.as_str(),
                    index + 1,
                ));
                continue;
            };

            let (value, notes) = reader.read(cell);
            let mut notes = notes.unwrap_or_default();
            let type_note = notes.get(TYPE_NOTE).map(str::to_string);
            if value.is_none() && type_note.is_none() {
                blank_cells.push(index);
            }

            if let Some(note) = type_note {
                error_cells.push(index);
                errors.push(TableError::cell(
                    ErrorCode::TypeError,
                    note,
                    texts(),
                    row_number,
                    stringify_cell(cell),
                    name.as_str(),
                    index + 1,
                ));
                notes = Default::default();
            }
            for (_, note) in notes.iter() {
                errors.push(TableError::cell(
                    ErrorCode::ConstraintError,
                    note,
                    texts(),
                    row_number,
                    stringify_cell(cell),
                    name.as_str(),
                    index + 1,
                ));
            }
            values.push(value);
        }

        for (index, cell) in cells.iter().enumerate().skip(readers.len()) {
            errors.push(TableError::cell(
                ErrorCode::ExtraCell,
                "",
                texts(),
                row_number,
                stringify_cell(cell),
                "",
                index + 1,
            ));
        }

        let extra_blank = cells
            .iter()
            .skip(readers.len())
            .all(|cell| stringify_cell(cell).is_empty());
        if !readers.is_empty() && blank_cells.len() == readers.len() && extra_blank {
            errors = vec![TableError::row(ErrorCode::BlankRow, "", texts(), row_number)];
        }

        Self {
            cells,
            field_names,
            values,
            row_number,
            blank_cells,
            error_cells,
            errors,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn row_number(&self) -> usize {
        self.row_number
    }

    /// Typed values in field order; `None` for missing or uncastable cells.
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.field_names.iter().position(|field| field == name)?;
        self.values.get(index)?.as_ref()
    }

    /// Names of fields whose cell is missing.
    pub fn blank_cells(&self) -> impl Iterator<Item = &str> {
        self.blank_cells.iter().map(|index| self.field_names[*index].as_str())
    }

    /// Names of fields whose cell failed to cast.
    pub fn error_cells(&self) -> impl Iterator<Item = &str> {
        self.error_cells.iter().map(|index| self.field_names[*index].as_str())
    }

    pub fn is_blank(&self) -> bool {
        self.errors
            .first()
            .is_some_and(|error| error.code() == ErrorCode::BlankRow)
    }

    pub fn errors(&self) -> &[TableError] {
        &self.errors
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn push_error(&mut self, error: TableError) {
        self.errors.push(error);
    }

    /// Raw cells as strings, as carried by row errors.
    pub fn cell_strings(&self) -> Vec<String> {
        self.cells.iter().map(stringify_cell).collect()
    }

    /// Field name to JSON value.
    pub fn to_map(&self) -> Map<String, Cell> {
        self.field_names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| {
                let value = value.as_ref().map(Value::to_json).unwrap_or(Cell::Null);
                (name.clone(), value)
            })
            .collect()
    }

    pub fn to_list(&self) -> Vec<Cell> {
        self.values
            .iter()
            .map(|value| value.as_ref().map(Value::to_json).unwrap_or(Cell::Null))
            .collect()
    }
}

struct UniqueIndex {
    index: usize,
    name: String,
    seen: HashMap<String, usize>,
}

struct PrimaryKeyIndex {
    indexes: Vec<usize>,
    seen: HashMap<Vec<String>, usize>,
}

struct ForeignGroup {
    indexes: Vec<usize>,
    field_names: Vec<String>,
    lookup_name: String,
    reference_name: String,
    reference_field_names: Vec<String>,
}

/// Seen-value indexes for `unique`, the primary key and foreign keys.
///
/// Keys with a `None` component are exempt from primary key tracking. A
/// foreign key whose values are all `None` is not checked.
pub struct RowIntegrity {
    unique: Vec<UniqueIndex>,
    primary_key: Option<PrimaryKeyIndex>,
    foreign: Vec<ForeignGroup>,
    lookup: Option<Arc<ForeignKeyLookup>>,
}

impl RowIntegrity {
    /// Indexes for `schema`, read through rows with `field_names`. Self
    /// references resolve to `resource_name` in the lookup.
    pub fn new(
        schema: &Schema,
        field_names: &[String],
        resource_name: &str,
        lookup: Option<Arc<ForeignKeyLookup>>,
    ) -> Self {
        let position = |name: &str| field_names.iter().position(|field| field == name);
        let positions = |names: &[String]| -> Option<Vec<usize>> {
            names.iter().map(|name| position(name)).collect()
        };

        let unique = schema
            .fields
            .iter()
            .filter(|field| field.constraints.unique)
            .filter_map(|field| {
                Some(UniqueIndex {
                    index: position(&field.name)?,
                    name: field.name.clone(),
                    seen: HashMap::new(),
                })
            })
            .collect();

        let primary_key = (!schema.primary_key.is_empty())
            .then(|| positions(&schema.primary_key))
            .flatten()
            .map(|indexes| PrimaryKeyIndex {
                indexes,
                seen: HashMap::new(),
            });

        let foreign = if lookup.is_some() {
            schema
                .foreign_keys
                .iter()
                .filter_map(|key| {
                    let lookup_name = if key.is_self_reference() {
                        resource_name.to_string()
                    } else {
                        key.reference.resource.clone()
                    };
                    Some(ForeignGroup {
                        indexes: positions(&key.fields)?,
                        field_names: key.fields.clone(),
                        lookup_name,
                        reference_name: key.reference.resource.clone(),
                        reference_field_names: key.reference.fields.clone(),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            unique,
            primary_key,
            foreign,
            lookup,
        }
    }

    /// Whether any index is active.
    pub fn is_active(&self) -> bool {
        !self.unique.is_empty() || self.primary_key.is_some() || !self.foreign.is_empty()
    }

    /// Adds `unique-error`, `primary-key-error` and `foreign-key-error` to
    /// the row.
    pub fn check(&mut self, row: &mut Row) {
        let row_number = row.row_number();

        for unique in &mut self.unique {
            let Some(Some(value)) = row.values.get(unique.index) else {
                continue;
            };
            if let Some(previous) = unique.seen.insert(value.key(), row_number) {
                let cell = row.cells.get(unique.index).map(stringify_cell).unwrap_or_default();
                row.push_error(TableError::cell(
                    ErrorCode::UniqueError,
                    format!("the same as in the row at position {previous}"),
                    row.cell_strings(),
                    row_number,
                    cell,
                    unique.name.as_str(),
                    unique.index + 1,
                ));
            }
        }

        if let Some(primary_key) = &mut self.primary_key
            && let Some(key) = key_of(row, &primary_key.indexes)
            && let Some(previous) = primary_key.seen.insert(key, row_number)
        {
            row.push_error(TableError::row(
                ErrorCode::PrimaryKeyError,
                format!("the same as in the row at position {previous}"),
                row.cell_strings(),
                row_number,
            ));
        }

        let Some(lookup) = &self.lookup else {
            return;
        };
        for group in &self.foreign {
            let values: Vec<Option<&Value>> = group
                .indexes
                .iter()
                .map(|index| row.values.get(*index).and_then(Option::as_ref))
                .collect();
            if values.iter().all(Option::is_none) {
                continue;
            }
            let found = match key_of(row, &group.indexes) {
                Some(key) => lookup
                    .contains(&group.lookup_name, &group.reference_field_names, &key)
                    .unwrap_or(true),
                None => false,
            };
            if found {
                continue;
            }

            let shown: Vec<String> = values
                .iter()
                .map(|value| value.map(ToString::to_string).unwrap_or_default())
                .collect();
            let note = format!(
                "for \"{}\": values \"{}\" not found in the lookup table \"{}\" as \"{}\"",
                group.field_names.join(", "),
                shown.join(", "),
                group.reference_name,
                group.reference_field_names.join(", ")
            );
            let field_values = values
                .iter()
                .map(|value| value.map(Value::to_json).unwrap_or(Cell::Null))
                .collect();
            row.push_error(TableError::foreign_key(
                note,
                row.cell_strings(),
                row_number,
                group.field_names.clone(),
                field_values,
                group.reference_name.as_str(),
                group.reference_field_names.clone(),
            ));
        }
    }
}

/// Key tuple of a row, `None` when a component is missing.
pub(crate) fn key_of(row: &Row, indexes: &[usize]) -> Option<Vec<String>> {
    indexes
        .iter()
        .map(|index| row.values.get(*index)?.as_ref().map(Value::key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashSet;
    use tabular_core::{FieldBuilder, FieldType, SchemaBuilder};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .field(FieldBuilder::new("id", FieldType::Integer).build())
            .field(FieldBuilder::new("name", FieldType::String).max_length(10).build())
            .build()
    }

    fn row(schema: &Schema, cells: Vec<Cell>, row_number: usize) -> Row {
        let names: Arc<[String]> = schema.fields.iter().map(|field| field.name.clone()).collect();
        Row::new(cells, &schema.cell_readers(), names, row_number)
    }

    fn codes(row: &Row) -> Vec<(ErrorCode, Option<usize>)> {
        row.errors()
            .iter()
            .map(|error| (error.code(), error.field_number()))
            .collect()
    }

    #[test]
    fn test_valid_row() {
        let row = row(&schema(), vec![json!("1"), json!("english")], 2);
        assert!(row.valid());
        assert_eq!(row.get("id"), Some(&Value::Integer(1)));
        assert_eq!(row.to_map()["name"], json!("english"));
        assert_eq!(row.to_list(), vec![json!(1), json!("english")]);
    }

    #[test]
    fn test_missing_and_extra_cells() {
        let missing = row(&schema(), vec![json!("2")], 3);
        assert_eq!(codes(&missing), vec![(ErrorCode::MissingCell, Some(2))]);
        assert_eq!(missing.errors()[0].row_number(), Some(3));

        let extra = row(&schema(), vec![json!("1"), json!("a"), json!("x")], 2);
        assert_eq!(codes(&extra), vec![(ErrorCode::ExtraCell, Some(3))]);
    }

    #[test]
    fn test_type_and_constraint_errors() {
        let row = row(&schema(), vec![json!("x"), json!("far too long")], 2);
        assert_eq!(
            codes(&row),
            vec![(ErrorCode::TypeError, Some(1)), (ErrorCode::ConstraintError, Some(2))]
        );
        assert_eq!(row.error_cells().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(row.get("id"), None);
    }

    #[test]
    fn test_blank_row_replaces_errors() {
        let row = row(&schema(), vec![json!(""), json!("")], 4);
        assert_eq!(codes(&row), vec![(ErrorCode::BlankRow, None)]);
        assert!(row.is_blank());
        assert_eq!(row.blank_cells().count(), 2);
    }

    #[test]
    fn test_unique_and_primary_key() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("id", FieldType::Integer).build())
            .field(FieldBuilder::new("code", FieldType::String).unique(true).build())
            .primary_key(["id"])
            .build();
        let names: Vec<String> = vec!["id".into(), "code".into()];
        let mut integrity = RowIntegrity::new(&schema, &names, "data", None);
        assert!(integrity.is_active());

        let mut rows = vec![
            row(&schema, vec![json!("1"), json!("a")], 2),
            row(&schema, vec![json!("1"), json!("b")], 3),
            row(&schema, vec![json!(""), json!("a")], 4),
            row(&schema, vec![json!(""), json!("c")], 5),
        ];
        for row in &mut rows {
            integrity.check(row);
        }
        assert!(rows[0].valid());
        assert_eq!(codes(&rows[1]), vec![(ErrorCode::PrimaryKeyError, None)]);
        assert_eq!(rows[1].errors()[0].note(), "the same as in the row at position 2");
        assert_eq!(codes(&rows[2]), vec![(ErrorCode::UniqueError, Some(2))]);
        assert!(rows[3].valid());
    }

    #[test]
    fn test_foreign_keys() {
        let schema = SchemaBuilder::new()
            .field(FieldBuilder::new("id", FieldType::Integer).build())
            .field(FieldBuilder::new("parent", FieldType::Integer).build())
            .foreign_key(["parent"], "", ["id"])
            .build();
        let mut lookup = ForeignKeyLookup::new();
        lookup.insert(
            "nodes",
            vec!["id".into()],
            HashSet::from([vec!["1".to_string()], vec!["2".to_string()]]),
        );
        let names: Vec<String> = vec!["id".into(), "parent".into()];
        let mut integrity = RowIntegrity::new(&schema, &names, "nodes", Some(Arc::new(lookup)));

        let mut found = row(&schema, vec![json!("2"), json!("1")], 2);
        let mut blank = row(&schema, vec![json!("3"), json!("")], 3);
        let mut missing = row(&schema, vec![json!("4"), json!("5")], 4);
        integrity.check(&mut found);
        integrity.check(&mut blank);
        integrity.check(&mut missing);

        assert!(found.valid());
        assert!(blank.valid());
        assert_eq!(codes(&missing), vec![(ErrorCode::ForeignKeyError, None)]);
        assert_eq!(
            missing.errors()[0].note(),
            "for \"parent\": values \"5\" not found in the lookup table \"\" as \"id\""
        );
        assert_eq!(missing.errors()[0].row_number(), Some(4));
    }
}
