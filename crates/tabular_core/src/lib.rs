//! # Tabular Core
//!
//! Core data structures of the tabular validation engine.
//!
//! This crate provides the metadata model and the type system used to read
//! tabular data: a [`Schema`] is an ordered list of [`Field`]s with keys and
//! missing values, a [`Dialect`] describes the header layout, and resource and
//! package descriptors tie them to data.
//!
//! ## Key Concepts
//!
//! - **Field**: casts raw cells to typed [`Value`]s and evaluates constraints
//! - **Schema**: ordered fields, primary and foreign keys, missing values
//! - **Dialect**: header rows, multi-row label joining, comments, format controls
//! - **Descriptors**: serde structures for resources and packages
//!
//! ## Example
//!
//! ```rust
//! use tabular_core::{FieldBuilder, FieldType, SchemaBuilder, Value};
//! use serde_json::json;
//!
//! let schema = SchemaBuilder::new()
//!     .field(FieldBuilder::new("id", FieldType::Integer).build())
//!     .field(FieldBuilder::new("name", FieldType::String).build())
//!     .build();
//!
//! let results = schema.read_cells(&[json!("1"), json!("english")]);
//! assert_eq!(results[0].0, Some(Value::Integer(1)));
//! ```

pub mod builder;
pub mod constraints;
pub mod descriptor;
pub mod dialect;
pub mod error;
pub mod field;
pub mod schema;
pub mod types;
pub mod value;

pub use builder::*;
pub use constraints::*;
pub use descriptor::*;
pub use dialect::*;
pub use error::*;
pub use field::*;
pub use schema::*;
pub use types::FieldType;
pub use value::*;
