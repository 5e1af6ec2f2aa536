//! Schema variant policies.
//!
//! A node's input and output record types are each either fixed by the
//! implementation or declared in the node's config. The four combinations
//! are the [`SchemaVariant`]s.

use pipewise_core::{RecordType, Schema, TypeToken};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::config::{INPUT_SCHEMA_KEY, NodeConfig, OUTPUT_SCHEMA_KEY};
use crate::error::{SchemaSide, WorkflowError, WorkflowResult};

/// Which of a node's shapes come from config and which are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SchemaVariant {
    /// Both shapes come from config.
    Dynamic,
    /// Input from config, output fixed by the implementation.
    DynamicInputFixedOutput,
    /// Input fixed by the implementation, output from config.
    FixedInputDynamicOutput,
    /// Both shapes fixed by the implementation.
    Fixed,
}

/// The synthesized input and output record types of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeModels {
    /// Type every invocation input is validated against.
    pub input: RecordType,
    /// Type every produced output is validated against.
    pub output: RecordType,
}

impl NodeModels {
    /// Synthesizes both record types for node `node`.
    pub fn synthesize(node: &str, input: &Schema, output: &Schema) -> Self {
        Self {
            input: RecordType::synthesize(record_name(node, SchemaSide::Input), input),
            output: RecordType::synthesize(record_name(node, SchemaSide::Output), output),
        }
    }
}

/// Schemas a node implementation declares for its fixed sides.
#[derive(Debug, Clone, Default)]
pub struct FixedSchemas {
    /// Fixed input schema.
    pub input: Option<Schema>,
    /// Fixed output schema.
    pub output: Option<Schema>,
}

impl SchemaVariant {
    /// Returns whether the input shape comes from config.
    pub const fn input_is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic | Self::DynamicInputFixedOutput)
    }

    /// Returns whether the output shape comes from config.
    pub const fn output_is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic | Self::FixedInputDynamicOutput)
    }

    /// Resolves both record types of node `node` under this policy.
    ///
    /// Config errors are reported before missing fixed schemas, so a user
    /// sees problems in their own config first.
    pub fn setup(
        self,
        node: &str,
        config: &NodeConfig,
        fixed: FixedSchemas,
    ) -> WorkflowResult<NodeModels> {
        self.check_config(node, config)?;

        let input = match (&config.input_schema, self) {
            _ if !self.input_is_dynamic() => fixed_schema(node, SchemaSide::Input, fixed.input)?,
            (Some(schema), _) => schema.clone(),
            (None, Self::Dynamic) => Schema::single("input_field_1", TypeToken::Str),
            (None, _) => Schema::single("input_1", TypeToken::Str),
        };
        let output = match (&config.output_schema, self) {
            _ if !self.output_is_dynamic() => {
                fixed_schema(node, SchemaSide::Output, fixed.output)?
            }
            (Some(schema), _) => schema.clone(),
            (None, _) => Schema::single("response", TypeToken::Str),
        };

        Ok(NodeModels::synthesize(node, &input, &output))
    }

    fn check_config(self, node: &str, config: &NodeConfig) -> WorkflowResult<()> {
        let reject = |message: String| WorkflowError::ConfigShape {
            node: node.to_owned(),
            message,
        };

        if !self.input_is_dynamic() && config.input_schema.is_some() {
            return Err(reject(format!(
                "{INPUT_SCHEMA_KEY} is fixed for {self} nodes and cannot be configured"
            )));
        }
        if !self.output_is_dynamic() && config.output_schema.is_some() {
            return Err(reject(format!(
                "{OUTPUT_SCHEMA_KEY} is fixed for {self} nodes and cannot be configured"
            )));
        }
        if self == Self::FixedInputDynamicOutput && config.output_schema.is_none() {
            return Err(reject(format!("{OUTPUT_SCHEMA_KEY} is required")));
        }
        Ok(())
    }
}

fn fixed_schema(node: &str, side: SchemaSide, schema: Option<Schema>) -> WorkflowResult<Schema> {
    schema
        .filter(|schema| !schema.is_empty())
        .ok_or_else(|| WorkflowError::SchemaDefinition {
            node: node.to_owned(),
            side,
        })
}

/// Name of the record type synthesized for one side of a node.
pub fn record_name(node: &str, side: SchemaSide) -> String {
    format!("{node}.{side}")
}
