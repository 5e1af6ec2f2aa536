//! Structural rules of workflow definitions.

use std::collections::HashSet;
use std::fmt;

use derive_builder::Builder;
use derive_more::{Deref, Display};
use strum::IntoStaticStr;

use super::{WorkflowDefinition, WorkflowDraft};
use crate::TRACING_TARGET_DEFINITION;
use crate::catalog::NodeCatalog;
use crate::error::{WorkflowError, WorkflowResult};

/// Default type name of the node that receives a workflow's inputs.
pub const INPUT_NODE_TYPE: &str = "InputNode";

/// Default type name of the node that returns a workflow's result.
pub const OUTPUT_NODE_TYPE: &str = "OutputNode";

/// Rules applied by a [`GraphValidator`].
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ValidatorConfig {
    /// Node type of which every level has exactly one root node.
    #[builder(default = "INPUT_NODE_TYPE.to_owned()")]
    pub input_node_type: String,

    /// Node type of which every level has at most one node, grouped or not.
    #[builder(default = "OUTPUT_NODE_TYPE.to_owned()")]
    pub output_node_type: String,

    /// Deepest allowed nesting of subworkflows; the top level is depth 0.
    #[builder(default = "16")]
    pub max_depth: usize,
}

impl ValidatorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let input = self.input_node_type.as_deref().unwrap_or(INPUT_NODE_TYPE);
        let output = self.output_node_type.as_deref().unwrap_or(OUTPUT_NODE_TYPE);
        if input.is_empty() || output.is_empty() {
            return Err("input and output node types must not be empty".into());
        }
        if input == output {
            return Err("input and output node types must differ".into());
        }
        Ok(())
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            input_node_type: INPUT_NODE_TYPE.to_owned(),
            output_node_type: OUTPUT_NODE_TYPE.to_owned(),
            max_depth: 16,
        }
    }
}

/// A structural rule a definition level breaks.
#[derive(Debug, Clone, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum GraphRule {
    /// Two nodes of one level share an id.
    #[display("node id `{id}` is not unique")]
    DuplicateNodeId {
        /// The shared id.
        id: String,
    },
    /// The level does not have exactly one root input node.
    #[display("workflow must have exactly one input node of type {node_type}, found {found}")]
    InputNodeCount {
        /// The designated input node type.
        node_type: String,
        /// How many root input nodes there are.
        found: usize,
    },
    /// The level has more than one output node.
    #[display("workflow must have at most one output node of type {node_type}, found {found}")]
    OutputNodeCount {
        /// The designated output node type.
        node_type: String,
        /// How many output nodes there are.
        found: usize,
    },
    /// A node's type is not in the catalog.
    #[display("node `{id}` has unknown node type `{node_type}`")]
    UnknownNodeType {
        /// The node.
        id: String,
        /// Its type name.
        node_type: String,
    },
    /// A node names itself as parent.
    #[display("node `{id}` is its own parent")]
    SelfParent {
        /// The node.
        id: String,
    },
    /// A node's parent is not a node of the same level.
    #[display("node `{id}` has missing parent `{parent_id}`")]
    DanglingParent {
        /// The node.
        id: String,
        /// The missing parent id.
        parent_id: String,
    },
    /// A link endpoint is not a node of the same level.
    #[display("link `{source_id}` -> `{target_id}` references missing node `{missing}`")]
    DanglingLink {
        /// The link's source node id.
        source_id: String,
        /// The link's target node id.
        target_id: String,
        /// The endpoint that does not exist.
        missing: String,
    },
    /// A subworkflow is nested deeper than allowed.
    #[display("subworkflow nesting exceeds the maximum depth of {max_depth}")]
    MaxDepthExceeded {
        /// The configured maximum.
        max_depth: usize,
    },
}

impl GraphRule {
    /// Returns the snake_case name of the rule.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// One broken rule and where it is broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Ids of the nodes owning the nested level, outermost first. Empty for
    /// the top level.
    pub location: Vec<String>,
    /// The broken rule.
    pub rule: GraphRule,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "{}", self.rule)
        } else {
            write!(f, "in {}: {}", self.location.join(" > "), self.rule)
        }
    }
}

/// Every rule a definition breaks, across all nesting levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct Violations(Vec<InvariantViolation>);

impl Violations {
    /// Returns the broken rules, in discovery order.
    pub fn rules(&self) -> impl Iterator<Item = &GraphRule> {
        self.0.iter().map(|violation| &violation.rule)
    }

    /// Returns the violations located at the given chain of node ids.
    pub fn at<'a>(&'a self, location: &'a [&'a str]) -> impl Iterator<Item = &'a GraphRule> + 'a {
        self.0
            .iter()
            .filter(move |violation| violation.location.iter().map(String::as_str).eq(location.iter().copied()))
            .map(|violation| &violation.rule)
    }

    fn report(&mut self, location: &[String], rule: GraphRule) {
        self.0.push(InvariantViolation {
            location: location.to_vec(),
            rule,
        });
    }
}

impl IntoIterator for Violations {
    type IntoIter = std::vec::IntoIter<InvariantViolation>;
    type Item = InvariantViolation;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0.len();
        let noun = if count == 1 { "rule" } else { "rules" };
        write!(f, "workflow definition breaks {count} structural {noun}")?;
        for violation in &self.0 {
            write!(f, "; {violation}")?;
        }
        Ok(())
    }
}

/// Checks workflow drafts against the structural rules.
#[derive(Debug, Clone)]
pub struct GraphValidator<'a> {
    catalog: &'a NodeCatalog,
    config: ValidatorConfig,
}

impl Default for GraphValidator<'static> {
    fn default() -> Self {
        Self::new(NodeCatalog::global())
    }
}

impl<'a> GraphValidator<'a> {
    /// Creates a validator resolving node types in `catalog`.
    pub fn new(catalog: &'a NodeCatalog) -> Self {
        Self {
            catalog,
            config: ValidatorConfig::default(),
        }
    }

    /// Replaces the rule configuration.
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the rule configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Returns every rule the draft breaks, at every nesting level.
    pub fn check(&self, draft: &WorkflowDraft) -> Violations {
        let mut violations = Violations::default();
        self.check_level(draft, &mut Vec::new(), &mut violations);
        violations
    }

    /// Turns the draft into a definition if it breaks no rule.
    pub fn validate(&self, draft: WorkflowDraft) -> WorkflowResult<WorkflowDefinition> {
        let violations = self.check(&draft);
        if !violations.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET_DEFINITION,
                violations = violations.len(),
                "rejected workflow definition"
            );
            return Err(WorkflowError::GraphInvariant(violations));
        }

        tracing::debug!(
            target: TRACING_TARGET_DEFINITION,
            nodes = draft.nodes.len(),
            links = draft.links.len(),
            "validated workflow definition"
        );
        Ok(WorkflowDefinition::from_validated(draft))
    }

    fn check_level(&self, draft: &WorkflowDraft, location: &mut Vec<String>, out: &mut Violations) {
        let mut ids = HashSet::with_capacity(draft.nodes.len());
        let mut duplicates = HashSet::new();
        for node in &draft.nodes {
            if !ids.insert(node.id.as_str()) && duplicates.insert(node.id.as_str()) {
                out.report(location, GraphRule::DuplicateNodeId { id: node.id.clone() });
            }
        }

        let count_roots = |node_type: &str| {
            draft
                .nodes
                .iter()
                .filter(|node| node.parent_id.is_none() && node.node_type == node_type)
                .count()
        };
        let inputs = count_roots(self.config.input_node_type.as_str());
        if inputs != 1 {
            out.report(location, GraphRule::InputNodeCount {
                node_type: self.config.input_node_type.clone(),
                found: inputs,
            });
        }
        let outputs = draft
            .nodes
            .iter()
            .filter(|node| node.node_type == self.config.output_node_type)
            .count();
        if outputs > 1 {
            out.report(location, GraphRule::OutputNodeCount {
                node_type: self.config.output_node_type.clone(),
                found: outputs,
            });
        }

        for node in &draft.nodes {
            if !self.catalog.is_valid(&node.node_type) {
                out.report(location, GraphRule::UnknownNodeType {
                    id: node.id.clone(),
                    node_type: node.node_type.clone(),
                });
            }
            match &node.parent_id {
                Some(parent) if parent == &node.id => {
                    out.report(location, GraphRule::SelfParent { id: node.id.clone() });
                }
                Some(parent) if !ids.contains(parent.as_str()) => {
                    out.report(location, GraphRule::DanglingParent {
                        id: node.id.clone(),
                        parent_id: parent.clone(),
                    });
                }
                _ => {}
            }
        }

        for link in &draft.links {
            for endpoint in [&link.source_id, &link.target_id] {
                if !ids.contains(endpoint.as_str()) {
                    out.report(location, GraphRule::DanglingLink {
                        source_id: link.source_id.clone(),
                        target_id: link.target_id.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }

        for node in &draft.nodes {
            let Some(nested) = node.subworkflow.as_deref() else {
                continue;
            };
            location.push(node.id.clone());
            if location.len() > self.config.max_depth {
                out.report(location, GraphRule::MaxDepthExceeded {
                    max_depth: self.config.max_depth,
                });
            } else {
                self.check_level(nested, location, out);
            }
            location.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::definition::WorkflowNode;

    fn draft(value: serde_json::Value) -> WorkflowDraft {
        serde_json::from_value(value).unwrap()
    }

    fn check(value: serde_json::Value) -> Violations {
        GraphValidator::default().check(&draft(value))
    }

    #[test]
    fn empty_workflow_needs_an_input_node() {
        let violations = check(json!({"nodes": []}));
        let rules: Vec<_> = violations.rules().collect();
        assert_eq!(rules, [&GraphRule::InputNodeCount {
            node_type: "InputNode".into(),
            found: 0,
        }]);
        assert!(violations.to_string().contains("exactly one input node"));
        assert!(violations.to_string().contains("found 0"));
    }

    #[test]
    fn counts_root_input_and_output_nodes() {
        let one_each = check(json!({"nodes": [
            {"id": "a", "node_type": "InputNode"},
            {"id": "b", "node_type": "OutputNode"},
        ]}));
        assert!(one_each.is_empty());

        let no_output = check(json!({"nodes": [{"id": "a", "node_type": "InputNode"}]}));
        assert!(no_output.is_empty());

        let doubled = check(json!({"nodes": [
            {"id": "a", "node_type": "InputNode"},
            {"id": "b", "node_type": "InputNode"},
            {"id": "c", "node_type": "OutputNode"},
            {"id": "d", "node_type": "OutputNode"},
        ]}));
        let names: Vec<_> = doubled.rules().map(GraphRule::name).collect();
        assert_eq!(names, ["input_node_count", "output_node_count"]);
    }

    #[test]
    fn grouped_output_nodes_still_count() {
        let violations = check(json!({"nodes": [
            {"id": "in", "node_type": "InputNode"},
            {"id": "group", "node_type": "FixedIterationLoopNode"},
            {"id": "o1", "node_type": "OutputNode"},
            {"id": "o2", "node_type": "OutputNode", "parent_id": "group"},
        ]}));
        assert_eq!(
            violations.rules().collect::<Vec<_>>(),
            [&GraphRule::OutputNodeCount {
                node_type: "OutputNode".into(),
                found: 2,
            }]
        );
    }

    #[test]
    fn grouped_input_nodes_do_not_count_as_roots() {
        let violations = check(json!({"nodes": [
            {"id": "group", "node_type": "FixedIterationLoopNode"},
            {"id": "a", "node_type": "InputNode"},
            {"id": "b", "node_type": "InputNode", "parent_id": "group"},
        ]}));
        assert!(violations.is_empty());
    }

    #[test]
    fn flags_duplicates_unknown_types_and_dangling_references() {
        let violations = check(json!({
            "nodes": [
                {"id": "a", "node_type": "InputNode"},
                {"id": "x", "node_type": "TeleportNode"},
                {"id": "x", "node_type": "StructuredOutputNode"},
                {"id": "x", "node_type": "PickOneNode"},
                {"id": "y", "node_type": "PickOneNode", "parent_id": "nowhere"},
                {"id": "z", "node_type": "PickOneNode", "parent_id": "z"},
            ],
            "links": [
                {"source_id": "a", "source_output_key": "o", "target_id": "ghost", "target_input_key": "i"}
            ]
        }));
        let rules: Vec<_> = violations.rules().cloned().collect();
        assert_eq!(rules, [
            GraphRule::DuplicateNodeId { id: "x".into() },
            GraphRule::UnknownNodeType {
                id: "x".into(),
                node_type: "TeleportNode".into(),
            },
            GraphRule::DanglingParent {
                id: "y".into(),
                parent_id: "nowhere".into(),
            },
            GraphRule::SelfParent { id: "z".into() },
            GraphRule::DanglingLink {
                source_id: "a".into(),
                target_id: "ghost".into(),
                missing: "ghost".into(),
            },
        ]);
    }

    #[test]
    fn collects_violations_from_every_level_in_one_pass() {
        let violations = check(json!({"nodes": [
            {"id": "a", "node_type": "InputNode"},
            {"id": "loop", "node_type": "FixedIterationLoopNode", "subworkflow": {"nodes": [
                {"id": "inner", "node_type": "SubworkflowNode", "subworkflow": {"nodes": [
                    {"id": "i", "node_type": "InputNode"},
                    {"id": "i", "node_type": "InputNode"},
                ]}},
            ]}},
            {"id": "b", "node_type": "OutputNode"},
            {"id": "c", "node_type": "OutputNode"},
        ]}));

        assert_eq!(violations.len(), 4);
        assert_eq!(violations.at(&[]).count(), 1);
        assert_eq!(
            violations.at(&["loop"]).collect::<Vec<_>>(),
            [&GraphRule::InputNodeCount {
                node_type: "InputNode".into(),
                found: 0,
            }]
        );
        let innermost: Vec<_> = violations.at(&["loop", "inner"]).map(GraphRule::name).collect();
        assert_eq!(innermost, ["duplicate_node_id", "input_node_count"]);
        assert!(violations.to_string().contains("in loop > inner: node id `i` is not unique"));
    }

    #[test]
    fn bounds_nesting_depth() {
        let config = ValidatorConfigBuilder::default().max_depth(1usize).build().unwrap();
        let validator = GraphValidator::new(NodeCatalog::global()).with_config(config);
        let nested = |inner: serde_json::Value| {
            json!({"nodes": [
                {"id": "in", "node_type": "InputNode"},
                {"id": "loop", "node_type": "FixedIterationLoopNode", "subworkflow": inner},
            ]})
        };
        let leaf = json!({"nodes": [{"id": "in", "node_type": "InputNode"}]});

        assert!(validator.check(&draft(nested(leaf.clone()))).is_empty());

        let violations = validator.check(&draft(nested(nested(leaf))));
        assert_eq!(
            violations.at(&["loop", "loop"]).collect::<Vec<_>>(),
            [&GraphRule::MaxDepthExceeded { max_depth: 1 }]
        );
    }

    #[test]
    fn designated_node_types_are_configurable() {
        let config = ValidatorConfigBuilder::default()
            .input_node_type("StaticValueNode")
            .build()
            .unwrap();
        let validator = GraphValidator::new(NodeCatalog::global()).with_config(config);
        let draft = WorkflowDraft::new().with_node(WorkflowNode::new("s", "StaticValueNode"));
        assert!(validator.validate(draft).is_ok());

        assert!(
            ValidatorConfigBuilder::default()
                .output_node_type("InputNode")
                .build()
                .is_err()
        );
    }
}
