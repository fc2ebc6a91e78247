//! Validation reports.
//!
//! A [`Report`] aggregates one [`ReportTask`] per validated resource. Reports
//! serialize to camelCase JSON and can be flattened into rows for
//! comparison:
//!
//! ```rust
//! use tabular_validator::{TableResource, Validator, ValidateOptions};
//!
//! let data = b"id,name\n1\n2,german\n".to_vec();
//! let report = Validator::new(ValidateOptions::default())
//!     .validate_resource(&TableResource::from_bytes(data, "csv"));
//!
//! assert!(!report.valid);
//! assert_eq!(
//!     report.flatten(&["rowNumber", "fieldNumber", "type"]),
//!     vec![vec![2.into(), 2.into(), "missing-cell".into()]] as Vec<Vec<tabular_core::Cell>>
//! );
//! ```

use crate::TableError;
use crate::loader::ByteStats;
use serde::Serialize;
use tabular_core::Cell;

/// Statistics of a whole report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportStats {
    pub tasks: usize,
    pub errors: usize,
    pub warnings: usize,
    pub seconds: f64,
}

/// Statistics of one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStats {
    pub errors: usize,
    pub warnings: usize,
    pub seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
}

/// Outcome of validating one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTask {
    pub valid: bool,
    pub name: String,
    pub place: String,
    pub labels: Vec<String>,
    pub stats: TaskStats,
    pub warnings: Vec<String>,
    pub errors: Vec<TableError>,
    /// Set when reading stopped early on a limit.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
}

impl ReportTask {
    pub fn new(name: impl Into<String>, place: impl Into<String>) -> Self {
        Self {
            valid: true,
            name: name.into(),
            place: place.into(),
            labels: Vec::new(),
            stats: TaskStats::default(),
            warnings: Vec::new(),
            errors: Vec::new(),
            partial: false,
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_errors(mut self, errors: Vec<TableError>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    /// Byte statistics; zero values are left out.
    pub fn with_byte_stats(mut self, stats: &ByteStats) -> Self {
        self.stats.md5 = stats.md5.clone();
        self.stats.sha256 = stats.sha256.clone();
        self.stats.bytes = (stats.bytes > 0).then_some(stats.bytes);
        self
    }

    pub fn with_table_stats(mut self, fields: usize, rows: usize) -> Self {
        self.stats.fields = (fields > 0).then_some(fields);
        self.stats.rows = (rows > 0).then_some(rows);
        self
    }

    /// Recomputes validity and counts; `seconds` is the task duration.
    pub fn finish(mut self, seconds: f64) -> Self {
        self.valid = self.errors.is_empty();
        self.stats.errors = self.errors.len();
        self.stats.warnings = self.warnings.len();
        self.stats.seconds = seconds;
        self
    }

    /// Projects each error onto the given descriptor keys; absent keys are
    /// `null`.
    pub fn flatten(&self, keys: &[&str]) -> Vec<Vec<Cell>> {
        self.errors.iter().map(|error| project(error, keys, None)).collect()
    }
}

fn project(error: &TableError, keys: &[&str], task_number: Option<usize>) -> Vec<Cell> {
    let descriptor = error.to_descriptor();
    keys.iter()
        .map(|key| match (*key, task_number) {
            ("taskNumber", Some(number)) => Cell::from(number),
            _ => descriptor.get(*key).cloned().unwrap_or(Cell::Null),
        })
        .collect()
}

/// Outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub valid: bool,
    pub stats: ReportStats,
    pub warnings: Vec<String>,
    /// Errors not tied to a task, such as an invalid package.
    pub errors: Vec<TableError>,
    pub tasks: Vec<ReportTask>,
}

impl Report {
    pub fn from_tasks(tasks: Vec<ReportTask>, seconds: f64) -> Self {
        Self::build(tasks, Vec::new(), Vec::new(), seconds)
    }

    /// A report for a run that failed before any task started.
    pub fn from_error(error: TableError, seconds: f64) -> Self {
        Self::build(Vec::new(), vec![error], Vec::new(), seconds)
    }

    pub fn build(
        tasks: Vec<ReportTask>,
        errors: Vec<TableError>,
        warnings: Vec<String>,
        seconds: f64,
    ) -> Self {
        let error_count = errors.len() + tasks.iter().map(|task| task.stats.errors).sum::<usize>();
        Self {
            valid: error_count == 0,
            stats: ReportStats {
                tasks: tasks.len(),
                errors: error_count,
                warnings: warnings.len(),
                seconds,
            },
            warnings,
            errors,
            tasks,
        }
    }

    /// The only task of a single-resource report.
    pub fn task(&self) -> Option<&ReportTask> {
        match self.tasks.as_slice() {
            [task] => Some(task),
            _ => None,
        }
    }

    /// All errors, report-level first, then task by task.
    pub fn all_errors(&self) -> impl Iterator<Item = &TableError> {
        self.errors
            .iter()
            .chain(self.tasks.iter().flat_map(|task| task.errors.iter()))
    }

    /// Projects each error onto the given descriptor keys. Task errors also
    /// expose `taskNumber` (1-based).
    pub fn flatten(&self, keys: &[&str]) -> Vec<Vec<Cell>> {
        let mut rows: Vec<Vec<Cell>> = self.errors.iter().map(|error| project(error, keys, None)).collect();
        for (index, task) in self.tasks.iter().enumerate() {
            rows.extend(task.errors.iter().map(|error| project(error, keys, Some(index + 1))));
        }
        rows
    }
}
