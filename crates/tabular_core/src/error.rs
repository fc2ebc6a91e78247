//! Error types for tabular metadata.
//!
//! These errors describe problems with the metadata itself (an invalid field,
//! schema or dialect), never with the data being validated. Data problems are
//! reported as notes by [`Field::read_cell`](crate::Field::read_cell) and
//! collected by the validator.

use thiserror::Error;

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Main error type for metadata operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A field descriptor is not usable as declared
    #[error("Field \"{field}\" is not valid: {message}")]
    InvalidField {
        /// Field name
        field: String,
        /// Description of the problem
        message: String,
    },

    /// A schema descriptor is not usable as declared
    #[error("Schema is not valid: {0}")]
    InvalidSchema(String),

    /// A dialect descriptor is not usable as declared
    #[error("Dialect is not valid: {0}")]
    InvalidDialect(String),

    /// A descriptor could not be (de)serialized
    #[error("Descriptor is not valid: {0}")]
    InvalidDescriptor(String),
}

impl CoreError {
    /// Creates a new field error.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema(message.into())
    }

    /// Creates a new dialect error.
    pub fn dialect(message: impl Into<String>) -> Self {
        Self::InvalidDialect(message.into())
    }

    /// Short error code used in reports (`field-error`, `schema-error`, ...).
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidField { .. } => "field-error",
            Self::InvalidSchema(_) => "schema-error",
            Self::InvalidDialect(_) => "dialect-error",
            Self::InvalidDescriptor(_) => "resource-error",
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidDescriptor(error.to_string())
    }
}
