use crate::{Cell, Field, Value};

pub(super) fn read_boolean(field: &Field, cell: &Cell) -> Option<Value> {
    match cell {
        Cell::Bool(value) => Some(Value::Boolean(*value)),
        Cell::String(text) => {
            if field.true_values().iter().any(|value| *value == text.as_str()) {
                Some(Value::Boolean(true))
            } else if field.false_values().iter().any(|value| *value == text.as_str()) {
                Some(Value::Boolean(false))
            } else {
                None
            }
        }
        _ => None,
    }
}

pub(super) fn write_boolean(field: &Field, value: bool) -> String {
    let values = if value {
        field.true_values()
    } else {
        field.false_values()
    };
    values
        .first()
        .map(|text| text.to_string())
        .unwrap_or_else(|| value.to_string())
}
