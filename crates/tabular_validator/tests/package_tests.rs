//! Validation of packages loaded from descriptor files.

use pretty_assertions::assert_eq;
use serde_json::{Value as Json, json};
use std::path::PathBuf;
use tabular_core::{PackageDescriptor, ResourceDescriptor};
use tabular_validator::{Package, ValidateOptions, Validator};

fn package_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/package.json")
}

fn load() -> Package {
    let path = package_path();
    let descriptor = tabular_descriptor::load_package(&path).unwrap();
    Package::new(descriptor).with_basepath(tabular_descriptor::basepath(&path))
}

#[test]
fn test_foreign_key_across_resources() {
    let report = Validator::new(ValidateOptions::default()).validate_package(&load());
    assert!(!report.valid);
    assert_eq!(report.stats.tasks, 2);
    assert!(report.tasks[0].valid);
    assert_eq!(
        report.flatten(&["taskNumber", "rowNumber", "type"]),
        vec![vec![json!(2), json!(4), json!("foreign-key-error")]]
    );
    let error = report.tasks[1].errors[0].to_descriptor();
    assert_eq!(error["fieldNames"], json!(["person"]));
    assert_eq!(error["fieldValues"], json!([5]));
    assert_eq!(error["referenceName"], json!("people"));
}

#[test]
fn test_parallel_keeps_resource_order() {
    let mut descriptor = tabular_descriptor::load_package(&package_path()).unwrap();
    for resource in &mut descriptor.resources {
        if let Some(schema) = &mut resource.schema {
            schema.foreign_keys.clear();
        }
    }
    let package = Package::new(descriptor).with_basepath(tabular_descriptor::basepath(&package_path()));
    let report = Validator::new(ValidateOptions::default().with_parallel(true)).validate_package(&package);
    assert!(report.valid);
    let names: Vec<&str> = report.tasks.iter().map(|task| task.name.as_str()).collect();
    assert_eq!(names, vec!["people", "orders"]);
}

#[test]
fn test_parallel_falls_back_with_foreign_keys() {
    let report = Validator::new(ValidateOptions::default().with_parallel(true)).validate_package(&load());
    assert_eq!(report.stats.errors, 1);
}

#[test]
fn test_unsafe_paths_need_trust() {
    let descriptor = PackageDescriptor::new(vec![
        ResourceDescriptor::from_path("/etc/hostname").with_name("host"),
    ]);
    let report = Validator::default().validate_package(&Package::new(descriptor));
    assert_eq!(report.flatten(&["type"]), vec![vec![json!("resource-error")]]);
}

#[test]
fn test_invalid_package_descriptor() {
    let people = ResourceDescriptor::from_data(vec![json!(["id"]), json!([1])]).with_name("same");
    let report = Validator::default()
        .validate_package(&Package::new(PackageDescriptor::new(vec![people.clone(), people])));
    assert!(!report.valid);
    assert!(report.tasks.is_empty());
    let rows: Vec<Vec<Json>> = report.flatten(&["taskNumber", "type"]);
    assert_eq!(rows, vec![vec![Json::Null, json!("package-error")]]);
}

#[test]
fn test_infer_package() {
    let descriptor = load().infer(true).unwrap();
    let people = &descriptor.resources[0];
    assert_eq!(people.stats.as_ref().unwrap().rows, Some(2));
    assert_eq!(people.encoding.as_deref(), Some("utf-8"));
    assert_eq!(people.schema.as_ref().unwrap().primary_key, vec!["id".to_string()]);
}
