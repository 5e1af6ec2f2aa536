//! Constant values.

use async_trait::async_trait;
use pipewise_core::{BoxedError, RecordInstance, RecordType, Schema};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{SchemaSide, WorkflowError, WorkflowResult};
use crate::node::config::NodeConfig;
use crate::node::variant::record_name;
use crate::node::{Invocation, Node, NodeModels, Payload, SchemaVariant};

const VALUES_KEY: &str = "values";

/// Emits the mapping configured under `values`, whatever its input.
///
/// The output type is inferred from the configured values; the input type
/// has no fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticValueNode;

/// Config of a [`StaticValueNode`].
#[derive(Debug, Clone, Deserialize)]
pub struct StaticValueNodeConfig {
    /// The values to emit.
    pub values: Map<String, Value>,
}

#[async_trait]
impl Node for StaticValueNode {
    type Config = StaticValueNodeConfig;

    const NAME: &'static str = "static_value_node";
    /// The output follows config, but through `values` rather than an
    /// `output_schema`: [`setup`](Node::setup) is a custom policy.
    const VARIANT: SchemaVariant = SchemaVariant::FixedInputDynamicOutput;

    fn setup(&self, config: &NodeConfig) -> WorkflowResult<NodeModels> {
        let reject = |message: String| WorkflowError::ConfigShape {
            node: Self::NAME.to_owned(),
            message,
        };
        if config.input_schema.is_some() || config.output_schema.is_some() {
            return Err(reject("schemas are inferred from values and cannot be configured".into()));
        }
        let values = match config.get(VALUES_KEY) {
            Some(Value::Object(values)) => values,
            Some(_) => return Err(reject(format!("{VALUES_KEY} must be an object"))),
            None => return Err(reject(format!("{VALUES_KEY} is required"))),
        };

        Ok(NodeModels {
            input: RecordType::synthesize(record_name(Self::NAME, SchemaSide::Input), &Schema::new()),
            output: RecordType::infer(record_name(Self::NAME, SchemaSide::Output), values),
        })
    }

    async fn run(
        &self,
        invocation: Invocation<'_, StaticValueNodeConfig>,
        _input: RecordInstance,
    ) -> Result<Payload, BoxedError> {
        Ok(invocation.config.values.into())
    }
}
