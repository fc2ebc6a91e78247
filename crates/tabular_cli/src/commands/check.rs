use anyhow::{Context, Result, bail};
use std::path::Path;
use tabular_core::{PackageDescriptor, ResourceDescriptor, Schema};
use tabular_descriptor::{Descriptor, load_descriptor, load_schema, parse_file};
use tracing::info;

use crate::output;

/// Metadata problems of a descriptor, found without reading data.
fn problems(descriptor: &Checked) -> Vec<String> {
    match descriptor {
        Checked::Schema(schema) => schema
            .metadata_errors()
            .iter()
            .map(ToString::to_string)
            .collect(),
        Checked::Resource(resource) => resource.validate().err().map(|e| e.to_string()).into_iter().collect(),
        Checked::Package(package) => package
            .validate()
            .err()
            .into_iter()
            .chain(package.resources.iter().filter_map(|resource| resource.validate().err()))
            .map(|e| e.to_string())
            .collect(),
    }
}

enum Checked {
    Schema(Schema),
    Resource(ResourceDescriptor),
    Package(PackageDescriptor),
}

pub fn execute(descriptor_path: &str, format: &str) -> Result<()> {
    info!("Checking descriptor: {}", descriptor_path);

    let path = Path::new(descriptor_path);
    let value: serde_json::Value = parse_file(path)
        .with_context(|| format!("Failed to parse descriptor file: {}", descriptor_path))?;
    let checked = if value.get("fields").is_some() {
        Checked::Schema(load_schema(path).with_context(|| format!("Invalid schema: {}", descriptor_path))?)
    } else {
        match load_descriptor(path).with_context(|| format!("Invalid descriptor: {}", descriptor_path))? {
            Descriptor::Resource(resource) => Checked::Resource(resource),
            Descriptor::Package(package) => Checked::Package(package),
        }
    };

    let problems = problems(&checked);
    match format {
        "json" => output::print_json(&serde_json::json!({
            "valid": problems.is_empty(),
            "kind": kind(&checked),
            "errors": problems,
        }))?,
        _ => print_summary(&checked, &problems),
    }

    if !problems.is_empty() {
        bail!("Descriptor is not valid: {}", descriptor_path);
    }
    Ok(())
}

fn kind(checked: &Checked) -> &'static str {
    match checked {
        Checked::Schema(_) => "schema",
        Checked::Resource(_) => "resource",
        Checked::Package(_) => "package",
    }
}

fn print_summary(checked: &Checked, problems: &[String]) {
    if problems.is_empty() {
        output::print_success(&format!("Descriptor is a valid {}", kind(checked)));
    } else {
        for problem in problems {
            output::print_error(problem);
        }
    }

    println!("\nDescriptor Summary:");
    match checked {
        Checked::Schema(schema) => print_schema(schema, "  "),
        Checked::Resource(resource) => print_resource(resource),
        Checked::Package(package) => {
            println!("  Name:        {}", package.name.as_deref().unwrap_or("N/A"));
            println!("  Title:       {}", package.title.as_deref().unwrap_or("N/A"));
            println!("  Resources:   {}", package.resources.len());
            for resource in &package.resources {
                println!();
                print_resource(resource);
            }
        }
    }
}

fn print_resource(resource: &ResourceDescriptor) {
    println!("  Resource:    {}", resource.resolved_name());
    println!("  Place:       {}", resource.place());
    if let Some(format) = &resource.format {
        println!("  Format:      {}", format);
    }
    if let Some(schema) = &resource.schema {
        print_schema(schema, "    ");
    }
}

fn print_schema(schema: &Schema, indent: &str) {
    println!("{indent}Fields:      {}", schema.fields.len());
    for field in &schema.fields {
        println!("{indent}  - {} ({})", field.name, field.field_type);
    }
    if !schema.primary_key.is_empty() {
        println!("{indent}Primary Key: {}", schema.primary_key.join(", "));
    }
    for key in &schema.foreign_keys {
        println!(
            "{indent}Foreign Key: {} -> {}({})",
            key.fields.join(", "),
            key.reference.resource,
            key.reference.fields.join(", ")
        );
    }
}
