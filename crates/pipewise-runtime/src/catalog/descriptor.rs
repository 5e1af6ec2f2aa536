//! Catalog entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WorkflowResult;
use crate::node::{DynNode, ExecutionContext, Node, NodeInstance};

/// Constructs a node of one type from its raw config.
pub type NodeLoader = fn(Value, ExecutionContext) -> WorkflowResult<Box<dyn DynNode>>;

/// Loader for node types that have a [`Default`] implementation.
///
/// ```rust
/// use pipewise_runtime::catalog::{NodeTypeDescriptor, load};
/// use pipewise_runtime::node::primitive::InputNode;
///
/// let descriptor = NodeTypeDescriptor::new("InputNode", "primitives", "io", "InputNode")
///     .with_loader(load::<InputNode>);
/// assert!(descriptor.loader().is_some());
/// ```
pub fn load<N: Node + Default>(
    config: Value,
    context: ExecutionContext,
) -> WorkflowResult<Box<dyn DynNode>> {
    Ok(Box::new(NodeInstance::construct(N::default(), config, context)?))
}

/// A registered node type.
#[derive(Debug, Clone)]
pub struct NodeTypeDescriptor {
    type_name: String,
    category: String,
    module_reference: String,
    class_reference: String,
    loader: Option<NodeLoader>,
}

impl NodeTypeDescriptor {
    /// Creates a descriptor without a loader.
    pub fn new(
        type_name: impl Into<String>,
        category: impl Into<String>,
        module_reference: impl Into<String>,
        class_reference: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            category: category.into(),
            module_reference: module_reference.into(),
            class_reference: class_reference.into(),
            loader: None,
        }
    }

    /// Attaches the loader that constructs nodes of this type.
    pub fn with_loader(mut self, loader: NodeLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub(super) fn set_loader(&mut self, loader: NodeLoader) {
        self.loader = Some(loader);
    }

    /// Returns the name workflows refer to this type by.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the palette category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns where the implementation lives.
    pub fn module_reference(&self) -> &str {
        &self.module_reference
    }

    /// Returns the implementing type's name.
    pub fn class_reference(&self) -> &str {
        &self.class_reference
    }

    /// Returns the loader, if one is registered in this process.
    pub fn loader(&self) -> Option<NodeLoader> {
        self.loader
    }

    /// Returns the listing entry for this type.
    pub fn summary(&self) -> NodeTypeSummary {
        NodeTypeSummary {
            type_name: self.type_name.clone(),
            module_reference: self.module_reference.clone(),
            class_reference: self.class_reference.clone(),
        }
    }
}

/// One entry of [`NodeCatalog::list_all`](super::NodeCatalog::list_all).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeSummary {
    /// Name workflows refer to the type by.
    pub type_name: String,
    /// Where the implementation lives.
    pub module_reference: String,
    /// The implementing type's name.
    pub class_reference: String,
}

/// A node type kept only so old workflows still load.
#[derive(Debug, Clone)]
pub struct DeprecatedNodeType {
    descriptor: NodeTypeDescriptor,
    replacement: String,
}

impl DeprecatedNodeType {
    pub(super) fn new(descriptor: NodeTypeDescriptor, replacement: String) -> Self {
        Self {
            descriptor,
            replacement,
        }
    }

    /// Returns the deprecated type's descriptor.
    pub fn descriptor(&self) -> &NodeTypeDescriptor {
        &self.descriptor
    }

    /// Returns the name of the supported type it resolves to.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}
