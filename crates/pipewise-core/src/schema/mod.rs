//! Runtime record-type synthesis.
//!
//! Node shapes are only known once a node is configured, so schemas are data:
//! - [`TypeToken`]: the type of one field, parsed from strings like `"list[int]"`
//! - [`FieldSchema`] / [`Schema`]: an ordered, duplicate-free field map
//! - [`RecordType`]: a named structural type synthesized from a schema
//! - [`RecordInstance`]: a value that passed validation against a record type

mod field;
mod record;
mod token;
mod validate;

pub use field::{FieldSchema, Schema};
pub use record::{RecordInstance, RecordType};
pub use token::TypeToken;
