//! Validation of resources and packages.
//!
//! The [`Validator`] opens a resource, runs the checklist over its rows and
//! collects the outcome into a [`Report`]. Failures to open or read are
//! reported, never returned: a report is always produced.
//!
//! # Example
//!
//! ```rust
//! use tabular_validator::{Checklist, CheckDescriptor, TableResource, ValidateOptions, Validator};
//!
//! let options = ValidateOptions::default()
//!     .with_checklist(Checklist::new().with_check(CheckDescriptor::DuplicateRow));
//! let data = b"id,name\n1,english\n1,english\n".to_vec();
//! let report = Validator::new(options).validate_resource(&TableResource::from_bytes(data, "csv"));
//!
//! assert!(!report.valid);
//! assert_eq!(report.tasks[0].errors[0].code().as_str(), "duplicate-row");
//! ```

use crate::checklist::Checklist;
use crate::checks::{Check, ExpectedTable, parse_hash};
use crate::package::{ForeignKeyLookup, Package};
use crate::report::{Report, ReportTask};
use crate::resource::{OpenTable, TableResource};
use crate::{ErrorCode, TableError};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tabular_core::FieldType;
use tracing::{debug, info, warn};

pub const DEFAULT_LIMIT_ERRORS: usize = 1000;

/// Options of a validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidateOptions {
    /// Stop a task once it has this many errors
    pub limit_errors: Option<usize>,

    /// Stop a task after this many data rows
    pub limit_rows: Option<usize>,

    /// Validate package resources in parallel when none declares foreign keys
    pub parallel: bool,

    pub checklist: Checklist,

    /// Read cells as declared, without inferring field types
    pub original: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            limit_errors: Some(DEFAULT_LIMIT_ERRORS),
            limit_rows: None,
            parallel: false,
            checklist: Checklist::default(),
            original: false,
        }
    }
}

impl ValidateOptions {
    pub fn with_limit_errors(mut self, limit: Option<usize>) -> Self {
        self.limit_errors = limit;
        self
    }

    pub fn with_limit_rows(mut self, limit: Option<usize>) -> Self {
        self.limit_rows = limit;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_checklist(mut self, checklist: Checklist) -> Self {
        self.checklist = checklist;
        self
    }

    pub fn with_original(mut self, original: bool) -> Self {
        self.original = original;
        self
    }
}

/// Validation engine.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidateOptions,
}

impl Validator {
    pub fn new(options: ValidateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ValidateOptions {
        &self.options
    }

    /// Validates one resource.
    pub fn validate_resource(&self, resource: &TableResource) -> Report {
        let start = Instant::now();
        info!("Validating resource {}", resource.name());
        let task = self.validate_task(resource, None);
        Report::from_tasks(vec![task], start.elapsed().as_secs_f64())
    }

    /// Validates every resource of a package, in resource order.
    ///
    /// Resources run in parallel when enabled, unless any resource declares
    /// foreign keys.
    pub fn validate_package(&self, package: &Package) -> Report {
        let start = Instant::now();
        info!(
            "Validating package {}",
            package.name().unwrap_or("<unnamed>")
        );
        if let Err(error) = package.validate() {
            return Report::from_error(error, start.elapsed().as_secs_f64());
        }

        let resources = package.resources();
        let tasks: Vec<ReportTask> = if self.options.parallel && !package.has_foreign_keys() {
            debug!("Validating {} resources in parallel", resources.len());
            resources
                .par_iter()
                .map(|resource| self.validate_task(resource, Some(package)))
                .collect()
        } else {
            resources
                .iter()
                .map(|resource| self.validate_task(resource, Some(package)))
                .collect()
        };
        Report::from_tasks(tasks, start.elapsed().as_secs_f64())
    }

    fn validate_task(&self, resource: &TableResource, package: Option<&Package>) -> ReportTask {
        let start = Instant::now();
        let checklist = &self.options.checklist;
        let fatal = |error: TableError| {
            warn!("Resource {} failed: {}", resource.name(), error.message());
            ReportTask::new(resource.name(), resource.place())
                .with_errors(vec![error])
                .finish(start.elapsed().as_secs_f64())
        };

        if let Err(error) = checklist.validate() {
            return fatal(error);
        }

        let resource = if self.options.original {
            let detector = resource.detector().clone().with_field_type(FieldType::Any);
            resource.clone().with_detector(detector)
        } else {
            resource.clone()
        };

        let mut warnings = Vec::new();
        if let Some(hash) = &resource.descriptor().hash
            && parse_hash(hash).is_none()
        {
            warnings.push("hash is ignored; supported algorithms: md5/sha256".to_string());
        }

        let lookup = if resource.descriptor().has_foreign_keys() {
            match ForeignKeyLookup::for_resource(&resource, package) {
                Ok(lookup) => Some(lookup),
                Err(error) => return fatal(error),
            }
        } else {
            None
        };

        let mut table = match resource.open() {
            Ok(table) => table,
            Err(error) => return fatal(error),
        };
        if let Some(lookup) = lookup {
            table.set_lookup(Arc::new(lookup));
        }

        let expected = ExpectedTable::from_descriptor(resource.descriptor());
        let mut checks = checklist.connect(expected);
        let mut run = Run {
            checklist,
            errors: Vec::new(),
        };
        run.start(&mut checks, &table);

        let mut partial = false;
        if let Some(limit) = run.reach_limit(self.options.limit_errors) {
            warnings.push(format!("reached error limit: {limit}"));
            partial = true;
        }
        let mut complete = true;
        let mut row_count = 0;
        let labels = table.labels().to_vec();
        let rows = if partial { None } else { Some(table.rows()) };
        for row in rows.into_iter().flatten() {
            let row = match row {
                Ok(row) => row,
                Err(error) => {
                    run.errors.push(error);
                    complete = false;
                    break;
                }
            };
            row_count += 1;
            for check in checks.iter_mut() {
                run.extend(check.validate_row(&row));
            }

            if let Some(limit) = run.reach_limit(self.options.limit_errors) {
                warnings.push(format!("reached error limit: {limit}"));
                partial = true;
                break;
            }
            if let Some(limit) = self.options.limit_rows
                && row_count >= limit
            {
                warnings.push(format!("reached row limit: {limit}"));
                partial = true;
                break;
            }
        }

        if !partial && complete {
            for check in checks.iter_mut() {
                run.extend(check.validate_end(&table));
            }
            if let Some(limit) = self.options.limit_errors
                && run.errors.len() > limit
            {
                run.errors.truncate(limit);
                warnings.push(format!("reached error limit: {limit}"));
                partial = true;
            }
        }

        let task = ReportTask::new(table.name(), table.place())
            .with_labels(labels)
            .with_byte_stats(&table.byte_stats())
            .with_table_stats(table.schema().fields.len(), table.row_count())
            .with_errors(run.errors)
            .with_warnings(warnings)
            .with_partial(partial)
            .finish(start.elapsed().as_secs_f64());
        debug!(
            "Validated {} rows of {} with {} errors",
            table.row_count(),
            task.name,
            task.errors.len()
        );
        task
    }
}

/// Errors collected for one task, filtered through the checklist.
struct Run<'a> {
    checklist: &'a Checklist,
    errors: Vec<TableError>,
}

impl Run<'_> {
    fn extend(&mut self, errors: Vec<TableError>) {
        self.errors
            .extend(errors.into_iter().filter(|error| self.checklist.match_error(error)));
    }

    /// Truncates the errors to `limit` once it is reached and returns it.
    fn reach_limit(&mut self, limit: Option<usize>) -> Option<usize> {
        let limit = limit?;
        if self.errors.len() < limit {
            return None;
        }
        self.errors.truncate(limit);
        Some(limit)
    }

    /// Starts every check; a check that fails to start is removed and its
    /// failure reported as `check-error`.
    fn start(&mut self, checks: &mut Vec<Box<dyn Check>>, table: &OpenTable) {
        let mut started = Vec::with_capacity(checks.len());
        for mut check in checks.drain(..) {
            match check.start(table) {
                Ok(errors) => {
                    self.extend(errors);
                    started.push(check);
                }
                Err(error) => {
                    debug!("Check {} removed: {}", check.code(), error.note());
                    let error = match error.code() {
                        ErrorCode::CheckError => error,
                        _ => TableError::check(error.note()),
                    };
                    self.extend(vec![error]);
                }
            }
        }
        *checks = started;
    }
}
