//! Workflow node entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::WorkflowDefinition;

/// Position of a node in the visual editor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Position {
    /// Creates a new position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One node of a workflow.
///
/// `S` is the type of the nested workflow a node may own: a
/// [`WorkflowDraft`](super::WorkflowDraft) before validation and a
/// [`WorkflowDefinition`] after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode<S = WorkflowDefinition> {
    /// Unique id within the node's definition level.
    pub id: String,
    /// Enclosing node at the same level, if the node is grouped under one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Catalog name of the node's type.
    pub node_type: String,
    /// Raw node configuration.
    #[serde(default)]
    pub config: Map<String, Value>,
    /// Editor position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Position>,
    /// Nested workflow owned by this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subworkflow: Option<Box<S>>,
}

impl<S> WorkflowNode<S> {
    /// Creates a node with an empty config.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            title: None,
            node_type: node_type.into(),
            config: Map::new(),
            coordinates: None,
            subworkflow: None,
        }
    }

    /// Sets the parent node.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Sets the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the config from a JSON object; other values leave it empty.
    pub fn with_config(mut self, config: Value) -> Self {
        if let Value::Object(config) = config {
            self.config = config;
        }
        self
    }

    /// Sets the editor position.
    pub fn with_coordinates(mut self, x: f64, y: f64) -> Self {
        self.coordinates = Some(Position::new(x, y));
        self
    }

    /// Sets the nested workflow.
    pub fn with_subworkflow(mut self, subworkflow: S) -> Self {
        self.subworkflow = Some(Box::new(subworkflow));
        self
    }

    /// Returns the config as a JSON object value.
    pub fn config_value(&self) -> Value {
        Value::Object(self.config.clone())
    }

    pub(super) fn map_subworkflow<T>(self, f: impl FnOnce(S) -> T) -> WorkflowNode<T> {
        WorkflowNode {
            id: self.id,
            parent_id: self.parent_id,
            title: self.title,
            node_type: self.node_type,
            config: self.config,
            coordinates: self.coordinates,
            subworkflow: self.subworkflow.map(|nested| Box::new(f(*nested))),
        }
    }
}
