//! Workflow definitions.
//!
//! A workflow is a list of nodes, the links between them and sample inputs.
//! A node may own a nested workflow. [`WorkflowDraft`] is the editable,
//! unchecked form; [`WorkflowDefinition`] is only produced by
//! [`GraphValidator`], which checks every level and reports every broken
//! rule at once.

mod link;
mod node;
mod validate;
mod workflow;

pub use link::WorkflowLink;
pub use node::{Position, WorkflowNode};
pub use validate::{
    GraphRule, GraphValidator, INPUT_NODE_TYPE, InvariantViolation, OUTPUT_NODE_TYPE,
    ValidatorConfig, ValidatorConfigBuilder, ValidatorConfigBuilderError, Violations,
};
pub use workflow::{WorkflowDefinition, WorkflowDraft};
