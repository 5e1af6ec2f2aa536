#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for schema synthesis and validation.
pub const TRACING_TARGET_SCHEMA: &str = "pipewise_core::schema";

mod error;
pub mod schema;

#[doc(hidden)]
pub mod prelude;

pub use error::{BoxedError, FieldViolation, SchemaError, SchemaResult, ValidationError, ViolationKind};
pub use schema::{FieldSchema, RecordInstance, RecordType, Schema, TypeToken};
