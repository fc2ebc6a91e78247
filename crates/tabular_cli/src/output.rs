use anyhow::Result;
use colored::*;
use serde::Serialize;
use tabular_validator::{Report, ReportTask, TableError};

pub fn print_validation_report(report: &Report, format: &str) -> Result<()> {
    match format {
        "json" => print_json(report),
        _ => {
            print_text_report(report);
            Ok(())
        }
    }
}

fn print_text_report(report: &Report) {
    println!("\n{}", "═".repeat(60));
    println!("{}", "  VALIDATION REPORT".bold());
    println!("{}", "═".repeat(60));

    if report.valid {
        println!(
            "\n{} {}",
            "✓".green().bold(),
            "Validation PASSED".green().bold()
        );
    } else {
        println!(
            "\n{} {}",
            "✗".red().bold(),
            "Validation FAILED".red().bold()
        );
    }

    if !report.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        print_errors(&report.errors, "  ");
    }

    for (index, task) in report.tasks.iter().enumerate() {
        print_task(index + 1, task);
    }

    println!("\n{}", "Summary:".bold());
    println!("  Total tasks:    {}", report.stats.tasks);
    println!("  Total errors:   {}", report.stats.errors);
    println!(
        "  Total warnings: {}",
        report.tasks.iter().map(|task| task.stats.warnings).sum::<usize>() + report.stats.warnings
    );
    println!("  Time:           {:.3}s", report.stats.seconds);
    println!("{}", "═".repeat(60));
}

fn print_task(number: usize, task: &ReportTask) {
    let status = if task.valid {
        "valid".green().bold()
    } else {
        "invalid".red().bold()
    };
    println!("\n{} {} ({}) {}", format!("Task {number}:").bold(), task.name, task.place, status);

    let mut stats = Vec::new();
    if let Some(rows) = task.stats.rows {
        stats.push(format!("rows: {rows}"));
    }
    if let Some(fields) = task.stats.fields {
        stats.push(format!("fields: {fields}"));
    }
    if let Some(bytes) = task.stats.bytes {
        stats.push(format!("bytes: {bytes}"));
    }
    if !stats.is_empty() {
        println!("  {}", stats.join("  "));
    }
    if task.partial {
        println!("  {}", "partial: stopped on a limit".yellow());
    }

    if !task.errors.is_empty() {
        println!("  {}", "Errors:".red().bold());
        print_errors(&task.errors, "    ");
    }

    if !task.warnings.is_empty() {
        println!("  {}", "Warnings:".yellow().bold());
        for (i, warning) in task.warnings.iter().enumerate() {
            println!("    {}. {}", i + 1, warning.yellow());
        }
    }
}

fn print_errors(errors: &[TableError], indent: &str) {
    for (i, error) in errors.iter().enumerate() {
        println!(
            "{indent}{}. [{}] {} {}",
            i + 1,
            position(error),
            error.code().as_str().bold(),
            error.message().red()
        );
    }
}

/// `row/field` position of an error; absent parts print as `-`.
fn position(error: &TableError) -> String {
    let part = |value: Option<usize>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    format!("{}/{}", part(error.row_number()), part(error.field_number()))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}
