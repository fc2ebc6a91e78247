//! Check selection and error filtering for a validation run.

use crate::checks::{Baseline, Check, CheckDescriptor, ExpectedTable};
use crate::{ErrorCode, Result, TableError};
use serde::{Deserialize, Serialize};

/// Checks to run in addition to the baseline, plus error filters.
///
/// `pick_errors` keeps only errors matching one of its codes or `#tags`;
/// `skip_errors` drops matching errors. Checks that could only produce
/// filtered-out errors are not run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pick_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_errors: Vec<String>,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check(mut self, check: CheckDescriptor) -> Self {
        self.checks.push(check);
        self
    }

    pub fn with_pick_errors(mut self, codes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.pick_errors.extend(codes.into_iter().map(Into::into));
        self
    }

    pub fn with_skip_errors(mut self, codes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.skip_errors.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Every filter entry must name a known code or tag.
    pub fn validate(&self) -> Result<()> {
        for entry in self.pick_errors.iter().chain(&self.skip_errors) {
            let known = ErrorCode::ALL
                .iter()
                .any(|code| code.as_str() == entry || code.tags().contains(&entry.as_str()));
            if !known {
                return Err(TableError::check(format!(
                    "error type \"{entry}\" is not supported"
                )));
            }
        }
        Ok(())
    }

    /// Whether errors of this code pass the filters.
    pub fn allows(&self, code: ErrorCode) -> bool {
        let matches = |entry: &String| code.as_str() == entry || code.tags().contains(&entry.as_str());
        if !self.pick_errors.is_empty() && !self.pick_errors.iter().any(matches) {
            return false;
        }
        !self.skip_errors.iter().any(matches)
    }

    pub fn match_error(&self, error: &TableError) -> bool {
        self.allows(error.code())
    }

    /// The baseline followed by the declared checks, dropping those whose
    /// errors would all be filtered out.
    pub fn connect(&self, expected: ExpectedTable) -> Vec<Box<dyn Check>> {
        std::iter::once(Box::new(Baseline::new(expected)) as Box<dyn Check>)
            .chain(self.checks.iter().map(CheckDescriptor::build))
            .filter(|check| check.emits().iter().any(|code| self.allows(*code)))
            .collect()
    }
}
