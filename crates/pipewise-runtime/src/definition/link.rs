//! Links between node outputs and inputs.

use serde::{Deserialize, Serialize};

/// Connects one output key of a node to one input key of another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowLink {
    /// Id of the producing node.
    pub source_id: String,
    /// Output field read from the producing node.
    pub source_output_key: String,
    /// Id of the consuming node.
    pub target_id: String,
    /// Input field written on the consuming node.
    pub target_input_key: String,
    /// Condition expression, evaluated by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl WorkflowLink {
    /// Creates an unconditional link.
    pub fn new(
        source_id: impl Into<String>,
        source_output_key: impl Into<String>,
        target_id: impl Into<String>,
        target_input_key: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            source_output_key: source_output_key.into(),
            target_id: target_id.into(),
            target_input_key: target_input_key.into(),
            condition: None,
        }
    }

    /// Sets the condition expression.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}
