//! Workflow exit point.

use async_trait::async_trait;
use pipewise_core::{BoxedError, RecordInstance, Schema};
use serde::Deserialize;

use super::mirrored_schema;
use crate::error::WorkflowResult;
use crate::node::config::{INPUT_SCHEMA_KEY, NodeConfig, OUTPUT_SCHEMA_KEY};
use crate::node::{Invocation, Node, NodeModels, Payload, SchemaVariant};

/// Collects the workflow's result and passes it on unchanged.
///
/// Its input type equals its output type, both read from `output_schema`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputNode;

/// Config of an [`OutputNode`].
#[derive(Debug, Clone, Deserialize)]
pub struct OutputNodeConfig {
    /// Fields the workflow returns.
    pub output_schema: Schema,
}

#[async_trait]
impl Node for OutputNode {
    type Config = OutputNodeConfig;

    const NAME: &'static str = "output_node";
    const VARIANT: SchemaVariant = SchemaVariant::Dynamic;

    fn setup(&self, config: &NodeConfig) -> WorkflowResult<NodeModels> {
        let schema = mirrored_schema(
            Self::NAME,
            config.output_schema.as_ref(),
            OUTPUT_SCHEMA_KEY,
            config.input_schema.as_ref(),
            INPUT_SCHEMA_KEY,
        )?;
        Ok(NodeModels::synthesize(Self::NAME, &schema, &schema))
    }

    async fn run(
        &self,
        _invocation: Invocation<'_, OutputNodeConfig>,
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
    use crate::node::{ExecutionContext, NodeInput, NodeInstance};

    #[tokio::test]
    async fn rejects_results_missing_declared_fields() {
        let mut node = NodeInstance::construct(
            OutputNode,
            json!({"output_schema": {"answer": "str"}}),
            ExecutionContext::empty(),
        )
        .unwrap();
        assert_eq!(node.visual_tag().acronym(), "ON");

        let output = node
            .invoke(NodeInput::Value(json!({"answer": "42"})))
            .await
            .unwrap();
        assert_eq!(output.get("answer"), Some(&json!("42")));

        let error = node.invoke(json!({"answer": 42})).await.unwrap_err();
        assert!(matches!(error, WorkflowError::InputValidation { .. }));
    }
}
