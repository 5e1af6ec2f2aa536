//! Registry of node types.
//!
//! The catalog maps the `node_type` names used in workflow definitions to
//! descriptors, grouped by palette category. Deprecated names stay valid and
//! resolve to their replacement. A catalog never changes once built, so it
//! is shared without locking; [`NodeCatalog::global`] holds the built-in
//! types.

mod builtin;
mod descriptor;

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

pub use descriptor::{DeprecatedNodeType, NodeLoader, NodeTypeDescriptor, NodeTypeSummary, load};

use crate::TRACING_TARGET_CATALOG;
use crate::error::{WorkflowError, WorkflowResult};
use crate::node::{DynNode, ExecutionContext};

static GLOBAL: LazyLock<NodeCatalog> = LazyLock::new(|| {
    let (catalog, problems) = NodeCatalog::builder().with_builtin_types().assemble();
    for problem in problems {
        tracing::error!(target: TRACING_TARGET_CATALOG, %problem, "skipped built-in catalog entry");
    }
    catalog
});

/// Read-only registry of node types.
#[derive(Debug, Clone)]
pub struct NodeCatalog {
    groups: Vec<(String, Vec<NodeTypeDescriptor>)>,
    supported: HashMap<String, NodeTypeDescriptor>,
    deprecated: Vec<DeprecatedNodeType>,
    aliases: HashMap<String, String>,
}

impl NodeCatalog {
    /// Returns the process-wide catalog of built-in node types.
    ///
    /// Built on first access. Only the primitives can be constructed from
    /// it; hosts that provide other node types build their own catalog.
    pub fn global() -> &'static NodeCatalog {
        &GLOBAL
    }

    /// Starts an empty catalog.
    pub fn builder() -> NodeCatalogBuilder {
        NodeCatalogBuilder::default()
    }

    /// Lists the supported types by category, in registration order.
    pub fn list_all(&self) -> CatalogListing {
        CatalogListing {
            groups: self
                .groups
                .iter()
                .map(|(category, descriptors)| {
                    let summaries = descriptors.iter().map(NodeTypeDescriptor::summary).collect();
                    (category.clone(), summaries)
                })
                .collect(),
        }
    }

    /// Returns whether `name` is a supported or deprecated type.
    pub fn is_valid(&self, name: &str) -> bool {
        self.supported.contains_key(name) || self.aliases.contains_key(name)
    }

    /// Returns whether `name` is a deprecated type.
    pub fn is_deprecated(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// Returns the supported type a deprecated name resolves to.
    pub fn replacement_of(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Returns the deprecated types.
    pub fn deprecated(&self) -> &[DeprecatedNodeType] {
        &self.deprecated
    }

    /// Returns the number of supported types.
    pub fn len(&self) -> usize {
        self.supported.len()
    }

    /// Returns whether no type is supported.
    pub fn is_empty(&self) -> bool {
        self.supported.is_empty()
    }

    /// Looks up a type, following a deprecated name to its replacement.
    pub fn resolve(&self, name: &str) -> WorkflowResult<&NodeTypeDescriptor> {
        if let Some(descriptor) = self.supported.get(name) {
            return Ok(descriptor);
        }

        let replacement = self
            .aliases
            .get(name)
            .ok_or_else(|| WorkflowError::UnknownNodeType(name.to_owned()))?;
        tracing::warn!(
            target: TRACING_TARGET_CATALOG,
            node_type = name,
            replacement = %replacement,
            "resolved deprecated node type"
        );
        self.supported
            .get(replacement)
            .ok_or_else(|| WorkflowError::UnknownNodeType(replacement.clone()))
    }

    /// Constructs a node of type `name` with the type's loader.
    pub fn create_node(
        &self,
        name: &str,
        config: Value,
        context: ExecutionContext,
    ) -> WorkflowResult<Box<dyn DynNode>> {
        let descriptor = self.resolve(name)?;
        let loader = descriptor
            .loader()
            .ok_or_else(|| WorkflowError::NodeUnavailable(descriptor.type_name().to_owned()))?;

        tracing::debug!(
            target: TRACING_TARGET_CATALOG,
            node_type = descriptor.type_name(),
            "creating node"
        );
        loader(config, context)
    }
}

/// Builds a [`NodeCatalog`].
#[derive(Debug, Default)]
pub struct NodeCatalogBuilder {
    groups: Vec<(String, Vec<NodeTypeDescriptor>)>,
    deprecated: Vec<DeprecatedNodeType>,
    loaders: Vec<(String, NodeLoader)>,
}

impl NodeCatalogBuilder {
    /// Adds a supported type under its category.
    pub fn register(mut self, descriptor: NodeTypeDescriptor) -> Self {
        match self
            .groups
            .iter_mut()
            .find(|(category, _)| category == descriptor.category())
        {
            Some((_, descriptors)) => descriptors.push(descriptor),
            None => self
                .groups
                .push((descriptor.category().to_owned(), vec![descriptor])),
        }
        self
    }

    /// Adds a deprecated type that resolves to `replacement`.
    pub fn deprecate(mut self, descriptor: NodeTypeDescriptor, replacement: impl Into<String>) -> Self {
        self.deprecated
            .push(DeprecatedNodeType::new(descriptor, replacement.into()));
        self
    }

    /// Attaches a loader to a supported type registered before or after.
    pub fn with_loader(mut self, type_name: impl Into<String>, loader: NodeLoader) -> Self {
        self.loaders.push((type_name.into(), loader));
        self
    }

    /// Registers the built-in node types.
    pub fn with_builtin_types(self) -> Self {
        builtin::register(self)
    }

    /// Builds the catalog, rejecting duplicate names, deprecated types
    /// without a supported replacement and loaders for unknown types.
    pub fn build(self) -> WorkflowResult<NodeCatalog> {
        let (catalog, problems) = self.assemble();
        if problems.is_empty() {
            Ok(catalog)
        } else {
            Err(WorkflowError::InvalidCatalog(problems.join("; ")))
        }
    }

    /// Builds the catalog from the consistent entries, listing the others.
    fn assemble(mut self) -> (NodeCatalog, Vec<String>) {
        let mut problems = Vec::new();

        for (type_name, loader) in self.loaders {
            let target = self
                .groups
                .iter_mut()
                .flat_map(|(_, descriptors)| descriptors.iter_mut())
                .find(|descriptor| descriptor.type_name() == type_name);
            match target {
                Some(descriptor) => descriptor.set_loader(loader),
                None => problems.push(format!("loader registered for unknown node type {type_name}")),
            }
        }

        let mut supported = HashMap::new();
        let mut groups = Vec::with_capacity(self.groups.len());
        for (category, descriptors) in self.groups {
            let mut kept = Vec::with_capacity(descriptors.len());
            for descriptor in descriptors {
                if supported.contains_key(descriptor.type_name()) {
                    problems.push(format!("duplicate node type {}", descriptor.type_name()));
                    continue;
                }
                supported.insert(descriptor.type_name().to_owned(), descriptor.clone());
                kept.push(descriptor);
            }
            groups.push((category, kept));
        }

        let mut aliases = HashMap::new();
        let mut deprecated = Vec::with_capacity(self.deprecated.len());
        for entry in self.deprecated {
            let name = entry.descriptor().type_name();
            if supported.contains_key(name) || aliases.contains_key(name) {
                problems.push(format!("duplicate node type {name}"));
            } else if !supported.contains_key(entry.replacement()) {
                problems.push(format!(
                    "deprecated node type {name} names unknown replacement {}",
                    entry.replacement()
                ));
            } else {
                aliases.insert(name.to_owned(), entry.replacement().to_owned());
                deprecated.push(entry);
            }
        }

        let catalog = NodeCatalog {
            groups,
            supported,
            deprecated,
            aliases,
        };
        (catalog, problems)
    }
}

/// Supported node types grouped by category, as returned by
/// [`NodeCatalog::list_all`].
///
/// Serializes as an object of category name to a list of summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogListing {
    groups: Vec<(String, Vec<NodeTypeSummary>)>,
}

impl CatalogListing {
    /// Returns the category names in registration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(category, _)| category.as_str())
    }

    /// Returns the types of one category.
    pub fn get(&self, category: &str) -> Option<&[NodeTypeSummary]> {
        self.groups
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, summaries)| summaries.as_slice())
    }

    /// Iterates over `(category, types)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NodeTypeSummary])> {
        self.groups
            .iter()
            .map(|(category, summaries)| (category.as_str(), summaries.as_slice()))
    }
}

impl Serialize for CatalogListing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (category, summaries) in &self.groups {
            map.serialize_entry(category, summaries)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::node::primitive::OutputNode;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn builtin_catalog_is_consistent() {
        assert_send_sync::<NodeCatalog>();
        let catalog = NodeCatalog::builder().with_builtin_types().build().unwrap();
        assert_eq!(catalog.len(), 15);
        assert_eq!(catalog.deprecated().len(), 5);
        assert_eq!(NodeCatalog::global().len(), catalog.len());
    }

    #[test]
    fn lists_categories_in_registration_order() {
        let listing = NodeCatalog::global().list_all();
        let categories: Vec<_> = listing.categories().collect();
        assert_eq!(categories, ["primitives", "json", "llm", "loops", "python"]);

        let primitives: Vec<_> = listing
            .get("primitives")
            .unwrap()
            .iter()
            .map(|summary| summary.type_name.as_str())
            .collect();
        assert_eq!(primitives, ["InputNode", "OutputNode", "StaticValueNode"]);

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(
            value["loops"],
            json!([{
                "type_name": "FixedIterationLoopNode",
                "module_reference": "nodes::loops::fixed_iteration_loop",
                "class_reference": "FixedIterationLoopNode",
            }])
        );
        assert!(value.get("deprecated").is_none());
    }

    #[test]
    fn validity_covers_deprecated_names() {
        let catalog = NodeCatalog::global();
        assert!(catalog.is_valid("InputNode"));
        assert!(catalog.is_valid("AdvancedLLMNode"));
        assert!(catalog.is_deprecated("AdvancedLLMNode"));
        assert!(!catalog.is_valid("TeleportNode"));
        assert!(!catalog.is_valid("inputnode"));
    }

    #[test]
    fn resolves_deprecated_names_to_replacements() {
        let catalog = NodeCatalog::global();
        assert_eq!(
            catalog.resolve("StringOutputLLMNode").unwrap().type_name(),
            "SingleLLMCallNode"
        );
        assert_eq!(
            catalog.resolve("SubworkflowNode").unwrap().type_name(),
            "FixedIterationLoopNode"
        );
        assert_eq!(catalog.replacement_of("SampleLLMNode"), Some("SingleLLMCallNode"));
        assert!(matches!(
            catalog.resolve("TeleportNode"),
            Err(WorkflowError::UnknownNodeType(name)) if name == "TeleportNode"
        ));
    }

    #[test]
    fn creates_primitives_only() {
        let catalog = NodeCatalog::global();
        let node = catalog
            .create_node(
                "StaticValueNode",
                json!({"values": {"a": 1}}),
                ExecutionContext::empty(),
            )
            .unwrap();
        assert_eq!(node.name(), "static_value_node");

        let error = catalog
            .create_node("AdvancedLLMNode", json!({}), ExecutionContext::empty())
            .unwrap_err();
        assert!(matches!(error, WorkflowError::NodeUnavailable(name) if name == "SingleLLMCallNode"));

        let error = catalog
            .create_node("InputNode", json!({}), ExecutionContext::empty())
            .unwrap_err();
        assert!(matches!(error, WorkflowError::ConfigShape { .. }));
    }

    #[test]
    fn hosts_attach_loaders_to_builtin_types() {
        let catalog = NodeCatalog::builder()
            .with_builtin_types()
            .with_loader("PickOneNode", load::<OutputNode>)
            .build()
            .unwrap();
        let node = catalog
            .create_node(
                "PickOneNode",
                json!({"output_schema": {"choice": "str"}}),
                ExecutionContext::empty(),
            )
            .unwrap();
        assert_eq!(node.output_model().schema().len(), 1);
    }

    #[test]
    fn rejects_inconsistent_catalogs() {
        let node = |name: &str| NodeTypeDescriptor::new(name, "misc", "m", name);

        let error = NodeCatalog::builder()
            .register(node("A"))
            .register(node("A"))
            .deprecate(node("Old"), "Missing")
            .with_loader("Ghost", load::<OutputNode>)
            .build()
            .unwrap_err();
        let message = error.to_string();
        assert!(message.contains("duplicate node type A"));
        assert!(message.contains("unknown replacement Missing"));
        assert!(message.contains("unknown node type Ghost"));
    }
}
