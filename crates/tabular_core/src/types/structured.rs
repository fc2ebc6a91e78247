use crate::{Cell, Field, Value};

pub(super) fn read_array(field: &Field, cell: &Cell) -> Option<Value> {
    let items = match cell {
        Cell::Array(items) => items.clone(),
        Cell::String(text) => match serde_json::from_str(text).ok()? {
            Cell::Array(items) => items,
            _ => return None,
        },
        _ => return None,
    };
    let Some(item_field) = field.array_item.as_deref() else {
        return Some(Value::Array(items));
    };
    items
        .iter()
        .map(|item| super::read_value(item_field, item).map(|value| value.to_json()))
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}

pub(super) fn read_object(cell: &Cell) -> Option<Value> {
    match cell {
        Cell::Object(map) => Some(Value::Object(map.clone())),
        Cell::String(text) => match serde_json::from_str(text).ok()? {
            Cell::Object(map) => Some(Value::Object(map)),
            _ => None,
        },
        _ => None,
    }
}
