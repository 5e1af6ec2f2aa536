//! Workflow entry point.

use async_trait::async_trait;
use pipewise_core::{BoxedError, RecordInstance, Schema};
use serde::Deserialize;

use super::mirrored_schema;
use crate::error::WorkflowResult;
use crate::node::config::{INPUT_SCHEMA_KEY, NodeConfig, OUTPUT_SCHEMA_KEY};
use crate::node::{Invocation, Node, NodeModels, Payload, SchemaVariant};

/// Receives the workflow's inputs and passes them on unchanged.
///
/// Its output type equals its input type, both read from `input_schema`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputNode;

/// Config of an [`InputNode`].
#[derive(Debug, Clone, Deserialize)]
pub struct InputNodeConfig {
    /// Fields the workflow accepts.
    pub input_schema: Schema,
}

#[async_trait]
impl Node for InputNode {
    type Config = InputNodeConfig;

    const NAME: &'static str = "input_node";
    const VARIANT: SchemaVariant = SchemaVariant::Dynamic;

    fn setup(&self, config: &NodeConfig) -> WorkflowResult<NodeModels> {
        let schema = mirrored_schema(
            Self::NAME,
            config.input_schema.as_ref(),
            INPUT_SCHEMA_KEY,
            config.output_schema.as_ref(),
            OUTPUT_SCHEMA_KEY,
        )?;
        Ok(NodeModels::synthesize(Self::NAME, &schema, &schema))
    }

    async fn run(
        &self,
        _invocation: Invocation<'_, InputNodeConfig>,
        input: RecordInstance,
    ) -> Result<Payload, BoxedError> {
        Ok(input.into())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::WorkflowError;
    use crate::node::{ExecutionContext, NodeInstance};

    #[tokio::test]
    async fn passes_inputs_through() {
        let mut node = NodeInstance::construct(
            InputNode,
            json!({"input_schema": {"question": "str", "k": "int"}}),
            ExecutionContext::empty(),
        )
        .unwrap();
        assert_eq!(node.input_model(), node.output_model());

        let output = node
            .invoke(json!({"question": "why?", "k": 2.0, "noise": true}))
            .await
            .unwrap();
        assert_eq!(output.dump(), json!({"question": "why?", "k": 2}));
    }

    #[test]
    fn requires_input_schema() {
        let error = NodeInstance::construct(InputNode, json!({}), ExecutionContext::empty())
            .unwrap_err();
        assert!(error.to_string().contains("input_schema is required"));

        let error = NodeInstance::construct(
            InputNode,
            json!({"input_schema": {"a": "str"}, "output_schema": {"a": "str"}}),
            ExecutionContext::empty(),
        )
        .unwrap_err();
        assert!(matches!(error, WorkflowError::ConfigShape { .. }));
    }
}
