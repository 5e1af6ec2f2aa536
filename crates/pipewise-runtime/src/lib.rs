#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod definition;
mod error;
pub mod graph;
pub mod node;

#[doc(hidden)]
pub mod prelude;

pub use error::{SchemaSide, WorkflowError, WorkflowResult};

/// Tracing target for node construction and invocation.
pub const TRACING_TARGET_NODE: &str = "pipewise_runtime::node";

/// Tracing target for catalog lookups.
pub const TRACING_TARGET_CATALOG: &str = "pipewise_runtime::catalog";

/// Tracing target for workflow definition validation.
pub const TRACING_TARGET_DEFINITION: &str = "pipewise_runtime::definition";

/// Tracing target for graph construction and link checks.
pub const TRACING_TARGET_GRAPH: &str = "pipewise_runtime::graph";
