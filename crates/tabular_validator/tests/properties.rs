//! Property tests over generated integer tables.

use proptest::prelude::*;
use tabular_validator::{ErrorCode, TableResource, Validator};

fn render(rows: &[Vec<i64>], width: usize) -> String {
    let mut text = (1..=width).map(|index| format!("f{index}")).collect::<Vec<_>>().join(",");
    text.push('\n');
    for row in rows {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        text.push_str(&cells.join(","));
        text.push('\n');
    }
    text
}

fn table() -> impl Strategy<Value = (usize, Vec<Vec<i64>>)> {
    (1usize..6).prop_flat_map(|width| {
        (
            Just(width),
            prop::collection::vec(prop::collection::vec(any::<i64>(), width), 1..40),
        )
    })
}

proptest! {
    #[test]
    fn test_integer_tables_are_valid((width, rows) in table()) {
        let resource = TableResource::from_bytes(render(&rows, width).into_bytes(), "csv");
        let report = Validator::default().validate_resource(&resource);
        prop_assert!(report.valid);
        prop_assert_eq!(report.tasks[0].stats.rows, Some(rows.len()));
        prop_assert_eq!(report.tasks[0].stats.fields, Some(width));
    }

    #[test]
    fn test_dropped_cell_is_one_missing_cell((width, rows) in table(), pick in any::<prop::sample::Index>()) {
        prop_assume!(width > 1);
        let mut rows = rows;
        let target = pick.index(rows.len());
        rows[target].pop();

        let resource = TableResource::from_bytes(render(&rows, width).into_bytes(), "csv");
        let report = Validator::default().validate_resource(&resource);
        let errors = &report.tasks[0].errors;
        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors[0].code(), ErrorCode::MissingCell);
        prop_assert_eq!(errors[0].row_number(), Some(target + 2));
        prop_assert_eq!(errors[0].field_number(), Some(width));
    }
}
