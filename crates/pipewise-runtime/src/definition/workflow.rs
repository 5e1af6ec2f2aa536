//! Workflow drafts and validated definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{GraphValidator, WorkflowLink, WorkflowNode};
use crate::error::{WorkflowError, WorkflowResult};

/// An unchecked workflow, as edited or parsed from the wire.
///
/// Turn it into a [`WorkflowDefinition`] to check the structural rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDraft {
    /// Nodes, in editor order.
    pub nodes: Vec<WorkflowNode<WorkflowDraft>>,
    /// Links between nodes of this level.
    #[serde(default)]
    pub links: Vec<WorkflowLink>,
    /// Sample inputs for trying the workflow out.
    #[serde(default)]
    pub test_inputs: Vec<Map<String, Value>>,
}

impl WorkflowDraft {
    /// Creates an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node.
    pub fn with_node(mut self, node: WorkflowNode<WorkflowDraft>) -> Self {
        self.nodes.push(node);
        self
    }

    /// Appends a link.
    pub fn with_link(mut self, link: WorkflowLink) -> Self {
        self.links.push(link);
        self
    }

    /// Appends a test input.
    pub fn with_test_input(mut self, input: Map<String, Value>) -> Self {
        self.test_inputs.push(input);
        self
    }
}

impl From<WorkflowDefinition> for WorkflowDraft {
    fn from(definition: WorkflowDefinition) -> Self {
        Self {
            nodes: definition
                .nodes
                .into_iter()
                .map(|node| node.map_subworkflow(WorkflowDraft::from))
                .collect(),
            links: definition.links,
            test_inputs: definition.test_inputs,
        }
    }
}

/// A workflow that satisfies every structural rule at every nesting level.
///
/// Only validation creates definitions, and they cannot be changed
/// afterwards; edit a [`WorkflowDraft`] and validate it again instead.
/// Deserializing validates against the built-in catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkflowDraft")]
pub struct WorkflowDefinition {
    nodes: Vec<WorkflowNode>,
    links: Vec<WorkflowLink>,
    test_inputs: Vec<Map<String, Value>>,
}

impl WorkflowDefinition {
    /// Validates a draft against the built-in catalog with default rules.
    pub fn new(draft: WorkflowDraft) -> WorkflowResult<Self> {
        GraphValidator::default().validate(draft)
    }

    /// Parses and validates the JSON wire form.
    pub fn from_value(value: Value) -> WorkflowResult<Self> {
        Self::new(serde_json::from_value(value)?)
    }

    /// Parses and validates the JSON wire form from text.
    pub fn from_json(json: &str) -> WorkflowResult<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    pub(super) fn from_validated(draft: WorkflowDraft) -> Self {
        Self {
            nodes: draft
                .nodes
                .into_iter()
                .map(|node| node.map_subworkflow(Self::from_validated))
                .collect(),
            links: draft.links,
            test_inputs: draft.test_inputs,
        }
    }

    /// Returns the nodes of this level.
    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    /// Returns the links of this level.
    pub fn links(&self) -> &[WorkflowLink] {
        &self.links
    }

    /// Returns the test inputs.
    pub fn test_inputs(&self) -> &[Map<String, Value>] {
        &self.test_inputs
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Returns the top-level nodes of one type, i.e. those without a parent.
    pub fn root_nodes_of_type<'a>(
        &'a self,
        node_type: &'a str,
    ) -> impl Iterator<Item = &'a WorkflowNode> + 'a {
        self.nodes
            .iter()
            .filter(move |node| node.parent_id.is_none() && node.node_type == node_type)
    }

    /// Returns the nested definitions with the id of the owning node.
    pub fn subworkflows(&self) -> impl Iterator<Item = (&str, &WorkflowDefinition)> {
        self.nodes.iter().filter_map(|node| {
            let nested = node.subworkflow.as_deref()?;
            Some((node.id.as_str(), nested))
        })
    }

    /// Returns the draft this definition was validated from.
    pub fn into_draft(self) -> WorkflowDraft {
        self.into()
    }
}

impl TryFrom<WorkflowDraft> for WorkflowDefinition {
    type Error = WorkflowError;

    fn try_from(draft: WorkflowDraft) -> Result<Self, Self::Error> {
        Self::new(draft)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::definition::GraphRule;

    fn sample() -> Value {
        json!({
            "nodes": [
                {
                    "id": "in",
                    "title": "Question",
                    "node_type": "InputNode",
                    "config": {"input_schema": {"question": "str"}},
                    "coordinates": {"x": 0.0, "y": 40.5}
                },
                {
                    "id": "loop",
                    "node_type": "FixedIterationLoopNode",
                    "config": {"iterations": 3},
                    "subworkflow": {
                        "nodes": [
                            {"id": "loop_in", "node_type": "InputNode", "config": {}},
                            {"id": "think", "node_type": "SingleLLMCallNode", "config": {}},
                            {"id": "loop_out", "node_type": "OutputNode", "config": {}}
                        ],
                        "links": [
                            {"source_id": "loop_in", "source_output_key": "q", "target_id": "think", "target_input_key": "q"}
                        ]
                    }
                },
                {"id": "out", "node_type": "OutputNode", "config": {"output_schema": {"answer": "str"}}}
            ],
            "links": [
                {"source_id": "in", "source_output_key": "question", "target_id": "loop", "target_input_key": "question", "condition": "len(question) > 0"},
                {"source_id": "loop", "source_output_key": "answer", "target_id": "out", "target_input_key": "answer"}
            ],
            "test_inputs": [{"question": "why?"}]
        })
    }

    #[test]
    fn parses_the_wire_shape() {
        let definition = WorkflowDefinition::from_value(sample()).unwrap();
        assert_eq!(definition.nodes().len(), 3);
        assert_eq!(definition.links()[0].condition.as_deref(), Some("len(question) > 0"));
        assert_eq!(definition.test_inputs().len(), 1);
        assert_eq!(definition.node("in").unwrap().coordinates.unwrap().y, 40.5);

        let nested: Vec<_> = definition.subworkflows().collect();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].0, "loop");
        assert!(nested[0].1.test_inputs().is_empty());
        assert_eq!(nested[0].1.root_nodes_of_type("InputNode").count(), 1);
    }

    #[test]
    fn round_trips_through_json() {
        let definition = WorkflowDefinition::from_value(sample()).unwrap();
        let text = serde_json::to_string(&definition).unwrap();
        let parsed: WorkflowDefinition = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, definition);

        let ids: Vec<_> = parsed.nodes().iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, ["in", "loop", "out"]);
        assert_eq!(serde_json::to_value(&parsed).unwrap(), serde_json::to_value(&definition).unwrap());
    }

    #[test]
    fn deserializing_validates() {
        let result = serde_json::from_value::<WorkflowDefinition>(json!({"nodes": []}));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("exactly one input node"));
    }

    #[test]
    fn reports_wire_errors_as_serialization() {
        let error = WorkflowDefinition::from_json("{\"links\": []}").unwrap_err();
        assert!(matches!(error, WorkflowError::Serialization(_)));
    }

    #[test]
    fn builds_drafts_in_code() {
        let draft = WorkflowDraft::new()
            .with_node(
                WorkflowNode::new("in", "InputNode")
                    .with_config(json!({"input_schema": {"q": "str"}}))
                    .with_coordinates(10.0, 20.0),
            )
            .with_node(WorkflowNode::new("llm", "AdvancedLLMNode").with_title("Answer"))
            .with_link(WorkflowLink::new("in", "q", "llm", "q"))
            .with_test_input(Map::new());

        let definition = WorkflowDefinition::new(draft.clone()).unwrap();
        assert_eq!(definition.clone().into_draft(), draft);

        let broken = draft.with_node(WorkflowNode::new("in", "OutputNode"));
        let error = WorkflowDefinition::new(broken).unwrap_err();
        let rules: Vec<_> = error.violations().unwrap().rules().collect();
        assert_eq!(rules, [&GraphRule::DuplicateNodeId { id: "in".into() }]);
    }
}
