//! Built-in nodes that move values into, through and out of a workflow.
//!
//! These are the only node types the runtime can construct on its own;
//! every other catalog entry needs a host-registered loader.

mod input;
mod output;
mod static_value;

pub use input::{InputNode, InputNodeConfig};
pub use output::{OutputNode, OutputNodeConfig};
pub use static_value::{StaticValueNode, StaticValueNodeConfig};

use pipewise_core::Schema;

use crate::error::{WorkflowError, WorkflowResult};

/// Reads the single schema a pass-through node mirrors on both sides.
fn mirrored_schema(
    node: &str,
    required: Option<&Schema>,
    required_key: &str,
    forbidden: Option<&Schema>,
    forbidden_key: &str,
) -> WorkflowResult<Schema> {
    if forbidden.is_some() {
        return Err(WorkflowError::ConfigShape {
            node: node.to_owned(),
            message: format!("{forbidden_key} is derived from {required_key} and cannot be configured"),
        });
    }
    required.cloned().ok_or_else(|| WorkflowError::ConfigShape {
        node: node.to_owned(),
        message: format!("{required_key} is required"),
    })
}
