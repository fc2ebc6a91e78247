use crate::{Cell, Field, Value};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use validator::{ValidateEmail, ValidateUrl};

/// String formats understood by the `string` type.
pub(crate) const STRING_FORMATS: &[&str] = &["default", "email", "uri", "uuid", "binary"];

pub(super) fn read_string(field: &Field, cell: &Cell) -> Option<Value> {
    let text = cell.as_str()?;
    let valid = match field.format() {
        "email" => text.validate_email(),
        "uri" => text.validate_url(),
        "uuid" => uuid::Uuid::parse_str(text).is_ok(),
        "binary" => STANDARD.decode(text).is_ok(),
        _ => true,
    };
    valid.then(|| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::{Field, FieldType, Value};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn string(format: &str) -> Field {
        let mut field = Field::new("text", FieldType::String);
        field.format = format.to_string();
        field
    }

    #[test]
    fn test_read_string_formats() {
        assert_eq!(
            string("default").read_cell(&json!("string")).0,
            Some(Value::String("string".into()))
        );
        assert_eq!(string("default").read_cell(&json!(1)).0, None);
        assert!(string("email").read_cell(&json!("name@gmail.com")).0.is_some());
        assert!(string("email").read_cell(&json!("http://google.com")).0.is_none());
        assert!(string("uri").read_cell(&json!("http://google.com")).0.is_some());
        assert!(string("uri").read_cell(&json!("string")).0.is_none());
        assert!(
            string("uuid")
                .read_cell(&json!("95ecc380-afe9-11e4-9b6c-751b66dd541e"))
                .0
                .is_some()
        );
        assert!(string("uuid").read_cell(&json!("95ecc380")).0.is_none());
        assert!(string("binary").read_cell(&json!("dGVzdA==")).0.is_some());
        assert!(string("binary").read_cell(&json!("@@")).0.is_none());
    }
}
