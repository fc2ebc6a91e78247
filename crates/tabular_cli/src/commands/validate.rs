use anyhow::{Context, Result};
use std::path::Path;
use tabular_validator::{Checklist, ValidateOptions, Validator};
use tracing::info;

use super::{ReadArgs, Target, ValidateArgs, load_target};
use crate::output;

pub fn execute(source: &str, read: &ReadArgs, args: &ValidateArgs, format: &str) -> Result<()> {
    info!("Validating: {}", source);

    let options = options(args)?;
    let target = load_target(source, read)?;
    let validator = Validator::new(options);
    let report = match &target {
        Target::Resource(resource) => validator.validate_resource(resource),
        Target::Package(package) => validator.validate_package(package),
    };

    output::print_validation_report(&report, format)?;

    if !report.valid {
        std::process::exit(1);
    }

    Ok(())
}

fn options(args: &ValidateArgs) -> Result<ValidateOptions> {
    let mut checklist = match &args.checklist {
        Some(path) => tabular_descriptor::parse_file::<Checklist>(Path::new(path))
            .with_context(|| format!("Failed to parse checklist file: {}", path))?,
        None => Checklist::new(),
    };
    if !args.pick_errors.is_empty() {
        checklist = checklist.with_pick_errors(args.pick_errors.iter().cloned());
    }
    if !args.skip_errors.is_empty() {
        checklist = checklist.with_skip_errors(args.skip_errors.iter().cloned());
    }

    let mut options = ValidateOptions::default()
        .with_limit_rows(args.limit_rows)
        .with_parallel(args.parallel)
        .with_checklist(checklist)
        .with_original(args.original);
    if let Some(limit) = args.limit_errors {
        options = options.with_limit_errors(Some(limit));
    }
    Ok(options)
}
