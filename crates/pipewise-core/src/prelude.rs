//! Prelude module for convenient imports.
//!
//! ```rust
//! use pipewise_core::prelude::*;
//! ```

pub use crate::error::{SchemaError, SchemaResult, ValidationError};
pub use crate::schema::{FieldSchema, RecordInstance, RecordType, Schema, TypeToken};
