//! Values crossing a node's invocation boundary.

use std::collections::BTreeMap;

use derive_more::From;
use pipewise_core::{RecordInstance, RecordType};
use serde_json::{Map, Value};

use super::ExecutionContext;

/// What a node is invoked with.
#[derive(Debug, Clone, From)]
pub enum NodeInput {
    /// Outputs of predecessor nodes, keyed by node id.
    ///
    /// An ephemeral record type is synthesized from the runtime types of the
    /// outputs and the mapping is checked against it before it is checked
    /// against the node's input type.
    Predecessors(BTreeMap<String, RecordInstance>),
    /// An already built input record.
    Record(RecordInstance),
    /// A raw JSON mapping of input fields, as assembled from links.
    Value(Value),
}

impl NodeInput {
    /// Collects predecessor outputs keyed by node id.
    pub fn predecessors<I, K>(outputs: I) -> Self
    where
        I: IntoIterator<Item = (K, RecordInstance)>,
        K: Into<String>,
    {
        Self::Predecessors(outputs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<Map<String, Value>> for NodeInput {
    fn from(map: Map<String, Value>) -> Self {
        Self::Value(Value::Object(map))
    }
}

/// What a node's logic produces.
///
/// Either form is validated against the node's output type before it is
/// returned to the caller.
#[derive(Debug, Clone, From)]
pub enum Payload {
    /// A record instance, dumped and revalidated.
    Record(RecordInstance),
    /// A raw JSON value, validated directly.
    Value(Value),
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Value(Value::Object(map))
    }
}

/// Everything a node's logic may read during one invocation.
#[derive(Debug)]
pub struct Invocation<'a, C> {
    /// Typed config, read from the raw config for this invocation.
    pub config: C,
    /// The context handed to the node at construction.
    pub context: &'a ExecutionContext,
    /// The node's input type.
    pub input_model: &'a RecordType,
    /// The node's output type.
    pub output_model: &'a RecordType,
}
