//! Node contracts.
//!
//! A node implements [`Node`]: a name, a [`SchemaVariant`] and an async
//! `run`. Wrapping it in a [`NodeInstance`] resolves its record types from
//! its config and validates every invocation against them.

mod config;
mod context;
mod contract;
mod io;
pub mod primitive;
mod variant;
mod visual;

pub use config::{INPUT_SCHEMA_KEY, NodeConfig, OUTPUT_SCHEMA_KEY};
pub use context::ExecutionContext;
pub use contract::{DynNode, Node, NodeInstance};
pub use io::{Invocation, NodeInput, Payload};
pub use variant::{FixedSchemas, NodeModels, SchemaVariant, record_name};
pub use visual::VisualTag;
