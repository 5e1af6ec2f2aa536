//! Raw node configuration.

use pipewise_core::Schema;
use serde_json::{Map, Value};

use crate::error::{WorkflowError, WorkflowResult};

/// Config key holding a declared input schema.
pub const INPUT_SCHEMA_KEY: &str = "input_schema";

/// Config key holding a declared output schema.
pub const OUTPUT_SCHEMA_KEY: &str = "output_schema";

/// A node's configuration split into its schema declarations and the rest.
///
/// The remaining keys are opaque here; each node reads them through its
/// typed [`Node::Config`](super::Node::Config).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeConfig {
    /// Declared `input_schema`, if any.
    pub input_schema: Option<Schema>,
    /// Declared `output_schema`, if any.
    pub output_schema: Option<Schema>,
    /// Every other key.
    pub values: Map<String, Value>,
}

impl NodeConfig {
    /// Reads the config of node `node`.
    ///
    /// Null is treated as an empty object. Anything else that is not an
    /// object, and schema declarations that do not parse, are rejected.
    pub fn from_value(node: &str, value: &Value) -> WorkflowResult<Self> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(WorkflowError::ConfigShape {
                    node: node.to_owned(),
                    message: format!("config must be an object, found {}", kind_of(other)),
                });
            }
        };

        let mut config = Self::default();
        for (key, value) in map {
            match key.as_str() {
                INPUT_SCHEMA_KEY => config.input_schema = Some(read_schema(node, key, value)?),
                OUTPUT_SCHEMA_KEY => config.output_schema = Some(read_schema(node, key, value)?),
                _ => {
                    config.values.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(config)
    }

    /// Returns a non-schema config value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

fn read_schema(node: &str, key: &str, value: &Value) -> WorkflowResult<Schema> {
    Schema::from_value(value).map_err(|err| WorkflowError::ConfigShape {
        node: node.to_owned(),
        message: format!("{key}: {err}"),
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
