//! Property tests for the cast/serialize laws of the field type system.

use proptest::prelude::*;
use serde_json::json;
use tabular_core::{Field, FieldBuilder, FieldType};

proptest! {
    #[test]
    fn test_integer_round_trip(value in any::<i64>()) {
        let field = Field::new("value", FieldType::Integer);
        let text = value.to_string();
        let (read, notes) = field.read_cell(&json!(text));
        prop_assert_eq!(notes, None);
        prop_assert_eq!(field.write_cell(read.as_ref()).0, Some(text));
    }

    #[test]
    fn test_grouped_number_round_trip(
        integer in 1u64..10_000_000_000,
        fraction in 1u32..1000,
    ) {
        let field = FieldBuilder::new("value", FieldType::Number)
            .decimal_char(",")
            .group_char(".")
            .build();
        let digits = integer.to_string();
        let mut grouped = String::new();
        for (index, digit) in digits.chars().enumerate() {
            if index > 0 && (digits.len() - index) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(digit);
        }
        let text = format!("{grouped},{fraction}");
        let (read, notes) = field.read_cell(&json!(text));
        prop_assert_eq!(notes, None);
        prop_assert_eq!(field.write_cell(read.as_ref()).0, Some(text));
    }

    #[test]
    fn test_missing_values_are_never_errors(
        sentinel in "[A-Za-z/.-]{0,4}",
        index in 0usize..FieldType::INFERENCE_ORDER.len(),
    ) {
        let field = FieldBuilder::new("value", FieldType::INFERENCE_ORDER[index])
            .missing_values([sentinel.clone()])
            .build();
        prop_assert_eq!(field.read_cell(&json!(sentinel)), (None, None));
    }

    #[test]
    fn test_date_round_trip(days in 0i64..100_000) {
        let date = chrono::NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
            + chrono::Duration::days(days);
        let text = date.format("%Y-%m-%d").to_string();
        let field = Field::new("value", FieldType::Date);
        let (read, notes) = field.read_cell(&json!(text));
        prop_assert_eq!(notes, None);
        prop_assert_eq!(field.write_cell(read.as_ref()).0, Some(text));
    }
}
