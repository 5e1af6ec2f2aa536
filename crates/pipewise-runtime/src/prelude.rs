//! Prelude module for convenient imports.
//!
//! ```rust
//! use pipewise_runtime::prelude::*;
//! ```

pub use crate::catalog::{NodeCatalog, NodeTypeDescriptor};
pub use crate::definition::{
    GraphValidator, ValidatorConfig, WorkflowDefinition, WorkflowDraft, WorkflowLink, WorkflowNode,
};
pub use crate::error::{WorkflowError, WorkflowResult};
pub use crate::graph::WorkflowGraph;
pub use crate::node::{
    DynNode, ExecutionContext, Invocation, Node, NodeInput, NodeInstance, Payload, SchemaVariant,
    VisualTag,
};
