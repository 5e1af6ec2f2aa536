//! The node contract and its validating instance wrapper.

use std::fmt;

use async_trait::async_trait;
use pipewise_core::{BoxedError, RecordInstance, RecordType, Schema, ValidationError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::config::NodeConfig;
use super::io::{Invocation, NodeInput, Payload};
use super::variant::{FixedSchemas, NodeModels, SchemaVariant};
use super::{ExecutionContext, VisualTag};
use crate::TRACING_TARGET_NODE;
use crate::error::{WorkflowError, WorkflowResult};

/// A pipeline step whose shapes are resolved from its config at runtime.
///
/// Implementations only describe their shapes and supply [`run`](Node::run).
/// Validation of config, inputs and outputs is done by [`NodeInstance`].
#[async_trait]
pub trait Node: Send + Sync + 'static {
    /// Snake_case node name, used in errors, record type names and the
    /// default visual tag.
    const NAME: &'static str;

    /// Which shapes are fixed and which come from config.
    const VARIANT: SchemaVariant;

    /// Typed view of the config. Unknown keys, including the schema
    /// declarations, should be ignored.
    type Config: DeserializeOwned + Send;

    /// Input schema for variants with a fixed input.
    fn fixed_input_schema(&self) -> Option<Schema> {
        None
    }

    /// Output schema for variants with a fixed output.
    fn fixed_output_schema(&self) -> Option<Schema> {
        None
    }

    /// Explicit visual tag; defaults to one derived from [`Node::NAME`].
    fn visual_tag(&self) -> Option<VisualTag> {
        None
    }

    /// Resolves the node's record types from its config.
    ///
    /// The default applies [`Node::VARIANT`]. Override it for shapes that
    /// follow some other rule.
    fn setup(&self, config: &NodeConfig) -> WorkflowResult<NodeModels> {
        let fixed = FixedSchemas {
            input: self.fixed_input_schema(),
            output: self.fixed_output_schema(),
        };
        Self::VARIANT.setup(Self::NAME, config, fixed)
    }

    /// Runs the node's logic on a validated input.
    async fn run(
        &self,
        invocation: Invocation<'_, Self::Config>,
        input: RecordInstance,
    ) -> Result<Payload, BoxedError>;
}

/// A constructed node: its config, context, record types and the values of
/// its last invocation.
pub struct NodeInstance<N: Node> {
    node: N,
    config: Value,
    context: ExecutionContext,
    models: NodeModels,
    visual_tag: VisualTag,
    last_input: Option<Value>,
    last_output: Option<Value>,
}

impl<N: Node> NodeInstance<N> {
    /// Constructs a node from its raw config.
    ///
    /// Resolves both record types and checks that the config reads as
    /// [`Node::Config`]. Any failure is returned before an instance exists.
    pub fn construct(node: N, config: Value, context: ExecutionContext) -> WorkflowResult<Self> {
        let config = match config {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let node_config = NodeConfig::from_value(N::NAME, &config)?;
        let models = node.setup(&node_config)?;
        let visual_tag = node
            .visual_tag()
            .unwrap_or_else(|| VisualTag::default_for(N::NAME));

        let instance = Self {
            node,
            config,
            context,
            models,
            visual_tag,
            last_input: None,
            last_output: None,
        };
        instance.config()?;

        tracing::debug!(
            target: TRACING_TARGET_NODE,
            node = N::NAME,
            variant = N::VARIANT.as_ref(),
            input_fields = instance.models.input.schema().len(),
            output_fields = instance.models.output.schema().len(),
            "constructed node"
        );
        Ok(instance)
    }

    /// Validates `input`, runs the node and validates what it produced.
    ///
    /// The validated input and output are kept for [`input`](Self::input)
    /// and [`output`](Self::output).
    pub async fn invoke(&mut self, input: impl Into<NodeInput>) -> WorkflowResult<RecordInstance> {
        let input = self.validate_input(input.into())?;
        self.last_input = Some(input.dump());
        self.last_output = None;

        let invocation = Invocation {
            config: self.config()?,
            context: &self.context,
            input_model: &self.models.input,
            output_model: &self.models.output,
        };
        let produced = self
            .node
            .run(invocation, input)
            .await
            .map_err(|source| WorkflowError::NodeFailed {
                node: N::NAME.to_owned(),
                source,
            })?;

        let output = self.validate_output(produced)?;
        self.last_output = Some(output.dump());

        tracing::debug!(target: TRACING_TARGET_NODE, node = N::NAME, "node invoked");
        Ok(output)
    }

    /// Reads the raw config as [`Node::Config`].
    pub fn config(&self) -> WorkflowResult<N::Config> {
        N::Config::deserialize(&self.config).map_err(|err| WorkflowError::ConfigShape {
            node: N::NAME.to_owned(),
            message: err.to_string(),
        })
    }

    /// Returns the input of the last invocation, revalidated.
    pub fn input(&self) -> WorkflowResult<Option<RecordInstance>> {
        self.last_input
            .as_ref()
            .map(|value| self.models.input.validate(value).map_err(Self::input_error))
            .transpose()
    }

    /// Returns the output of the last successful invocation, revalidated.
    pub fn output(&self) -> WorkflowResult<Option<RecordInstance>> {
        self.last_output
            .as_ref()
            .map(|value| self.models.output.validate(value).map_err(Self::output_error))
            .transpose()
    }

    /// Returns the node name.
    pub fn name(&self) -> &'static str {
        N::NAME
    }

    /// Returns the node's schema variant.
    pub fn variant(&self) -> SchemaVariant {
        N::VARIANT
    }

    /// Returns the raw config.
    pub fn raw_config(&self) -> &Value {
        &self.config
    }

    /// Returns the input record type.
    pub fn input_model(&self) -> &RecordType {
        &self.models.input
    }

    /// Returns the output record type.
    pub fn output_model(&self) -> &RecordType {
        &self.models.output
    }

    /// Returns the visual tag.
    pub fn visual_tag(&self) -> &VisualTag {
        &self.visual_tag
    }

    /// Returns the execution context.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Returns the node implementation.
    pub fn node(&self) -> &N {
        &self.node
    }

    fn validate_input(&self, input: NodeInput) -> WorkflowResult<RecordInstance> {
        match input {
            NodeInput::Predecessors(outputs) => {
                let ephemeral = RecordType::from_instances(
                    format!("{}.predecessors", N::NAME),
                    outputs.iter().map(|(id, output)| (id.as_str(), output)),
                )?;
                let mapping: Map<String, Value> = outputs
                    .iter()
                    .map(|(id, output)| (id.clone(), output.dump()))
                    .collect();
                let mapping = ephemeral
                    .validate(&Value::Object(mapping))
                    .map_err(Self::input_error)?;
                self.models
                    .input
                    .validate(&mapping.into_value())
                    .map_err(Self::input_error)
            }
            NodeInput::Record(record) => self
                .models
                .input
                .revalidate(&record)
                .map_err(Self::input_error),
            NodeInput::Value(value) => self
                .models
                .input
                .validate(&value)
                .map_err(Self::input_error),
        }
    }

    fn validate_output(&self, produced: Payload) -> WorkflowResult<RecordInstance> {
        let validated = match produced {
            Payload::Record(record) => self.models.output.revalidate(&record),
            Payload::Value(value) => self.models.output.validate(&value),
        };
        validated.map_err(Self::output_error)
    }

    fn input_error(source: ValidationError) -> WorkflowError {
        WorkflowError::InputValidation {
            node: N::NAME.to_owned(),
            source,
        }
    }

    fn output_error(source: ValidationError) -> WorkflowError {
        WorkflowError::OutputValidation {
            node: N::NAME.to_owned(),
            source,
        }
    }
}

impl<N: Node> fmt::Debug for NodeInstance<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeInstance")
            .field("name", &N::NAME)
            .field("variant", &N::VARIANT)
            .field("config", &self.config)
            .field("input_model", &self.models.input)
            .field("output_model", &self.models.output)
            .field("visual_tag", &self.visual_tag)
            .finish_non_exhaustive()
    }
}

/// Object-safe view of a [`NodeInstance`], as handed out by the catalog.
#[async_trait]
pub trait DynNode: Send + Sync + fmt::Debug {
    /// Returns the node name.
    fn name(&self) -> &'static str;
    /// Returns the node's schema variant.
    fn variant(&self) -> SchemaVariant;
    /// Returns the raw config.
    fn raw_config(&self) -> &Value;
    /// Returns the input record type.
    fn input_model(&self) -> &RecordType;
    /// Returns the output record type.
    fn output_model(&self) -> &RecordType;
    /// Returns the visual tag.
    fn visual_tag(&self) -> &VisualTag;
    /// Returns the input of the last invocation, revalidated.
    fn input(&self) -> WorkflowResult<Option<RecordInstance>>;
    /// Returns the output of the last successful invocation, revalidated.
    fn output(&self) -> WorkflowResult<Option<RecordInstance>>;
    /// Validates `input`, runs the node and validates what it produced.
    async fn invoke(&mut self, input: NodeInput) -> WorkflowResult<RecordInstance>;
}

#[async_trait]
impl<N: Node> DynNode for NodeInstance<N> {
    fn name(&self) -> &'static str {
        N::NAME
    }

    fn variant(&self) -> SchemaVariant {
        N::VARIANT
    }

    fn raw_config(&self) -> &Value {
        &self.config
    }

    fn input_model(&self) -> &RecordType {
        &self.models.input
    }

    fn output_model(&self) -> &RecordType {
        &self.models.output
    }

    fn visual_tag(&self) -> &VisualTag {
        &self.visual_tag
    }

    fn input(&self) -> WorkflowResult<Option<RecordInstance>> {
        NodeInstance::input(self)
    }

    fn output(&self) -> WorkflowResult<Option<RecordInstance>> {
        NodeInstance::output(self)
    }

    async fn invoke(&mut self, input: NodeInput) -> WorkflowResult<RecordInstance> {
        NodeInstance::invoke(self, input).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::error::SchemaSide;

    /// Produces `{"text": ...}` from its configured greeting.
    struct Greeter;

    #[derive(Deserialize)]
    struct GreeterConfig {
        greeting: String,
    }

    #[async_trait]
    impl Node for Greeter {
        const NAME: &'static str = "greeter";
        const VARIANT: SchemaVariant = SchemaVariant::Dynamic;
        type Config = GreeterConfig;

        async fn run(
            &self,
            invocation: Invocation<'_, GreeterConfig>,
            input: RecordInstance,
        ) -> Result<Payload, BoxedError> {
            let name = input.get("name").and_then(Value::as_str).unwrap_or("nobody");
            Ok(json!({"text": format!("{} {name}", invocation.config.greeting)}).into())
        }
    }

    /// Summarizes the `text` of predecessor `A`; fails on request.
    struct Summarizer;

    #[derive(Deserialize)]
    struct SummarizerConfig {
        #[serde(default)]
        fail: bool,
    }

    #[async_trait]
    impl Node for Summarizer {
        const NAME: &'static str = "summarizer";
        const VARIANT: SchemaVariant = SchemaVariant::Dynamic;
        type Config = SummarizerConfig;

        async fn run(
            &self,
            invocation: Invocation<'_, SummarizerConfig>,
            input: RecordInstance,
        ) -> Result<Payload, BoxedError> {
            if invocation.config.fail {
                return Err("model unavailable".into());
            }
            let text = input
                .get("A")
                .and_then(|a| a.get("text"))
                .and_then(Value::as_str)
                .ok_or("missing text")?;
            Ok(json!({"summary": text.to_uppercase(), "length": text.len()}).into())
        }
    }

    /// Declares a fixed input but forgets its fixed output.
    struct Incomplete;

    #[async_trait]
    impl Node for Incomplete {
        const NAME: &'static str = "incomplete";
        const VARIANT: SchemaVariant = SchemaVariant::Fixed;
        type Config = Value;

        fn fixed_input_schema(&self) -> Option<Schema> {
            Schema::from_value(&json!({"a": "int"})).ok()
        }

        async fn run(
            &self,
            _invocation: Invocation<'_, Value>,
            input: RecordInstance,
        ) -> Result<Payload, BoxedError> {
            Ok(input.into())
        }
    }

    /// Returns whatever the context carries as its output.
    struct ContextReader;

    #[async_trait]
    impl Node for ContextReader {
        const NAME: &'static str = "context_reader";
        const VARIANT: SchemaVariant = SchemaVariant::Dynamic;
        type Config = Value;

        async fn run(
            &self,
            invocation: Invocation<'_, Value>,
            _input: RecordInstance,
        ) -> Result<Payload, BoxedError> {
            let run_id = invocation.context.downcast_ref::<String>().ok_or("no run id")?;
            Ok(json!({"response": run_id}).into())
        }
    }

    fn greeter() -> NodeInstance<Greeter> {
        NodeInstance::construct(
            Greeter,
            json!({
                "greeting": "hello",
                "input_schema": {"name": "str"},
                "output_schema": {"text": "str"},
            }),
            ExecutionContext::empty(),
        )
        .unwrap()
    }

    fn summarizer(fail: bool) -> NodeInstance<Summarizer> {
        NodeInstance::construct(
            Summarizer,
            json!({
                "fail": fail,
                "input_schema": {"A": "dict"},
                "output_schema": {"summary": "str", "length": "int"},
            }),
            ExecutionContext::empty(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn invokes_with_raw_values() {
        let mut node = greeter();
        assert!(node.input().unwrap().is_none());

        let output = node.invoke(json!({"name": "ada", "extra": 1})).await.unwrap();
        assert_eq!(output.dump(), json!({"text": "hello ada"}));
        assert_eq!(node.input().unwrap().unwrap().dump(), json!({"name": "ada"}));
        assert_eq!(node.output().unwrap().unwrap(), output);
    }

    #[tokio::test]
    async fn feeds_predecessor_outputs_into_dynamic_input() {
        let mut a = greeter();
        let a_output = a.invoke(json!({"name": "bo"})).await.unwrap();

        let mut b = summarizer(false);
        let output = b
            .invoke(NodeInput::predecessors([("A", a_output.clone())]))
            .await
            .unwrap();
        assert_eq!(output.dump(), json!({"summary": "HELLO BO", "length": 8}));
        assert_eq!(output.record_type(), b.output_model());

        let error = b
            .invoke(NodeInput::predecessors([("B", a_output)]))
            .await
            .unwrap_err();
        match error {
            WorkflowError::InputValidation { node, source } => {
                assert_eq!(node, "summarizer");
                assert!(source.has_violation_at("A"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn rejects_mismatched_inputs_and_outputs() {
        let mut node = greeter();
        let error = node.invoke(json!({"name": 3})).await.unwrap_err();
        assert!(matches!(error, WorkflowError::InputValidation { .. }));
        assert!(node.input().unwrap().is_none());

        let mut b = summarizer(false);
        let bad_record = RecordType::infer("Other", &Map::new())
            .validate(&json!({}))
            .unwrap();
        let error = b.invoke(bad_record).await.unwrap_err();
        assert!(matches!(error, WorkflowError::InputValidation { .. }));

        let mut strict = NodeInstance::construct(
            Greeter,
            json!({"greeting": "hi", "output_schema": {"text": "int"}}),
            ExecutionContext::empty(),
        )
        .unwrap();
        let error = strict
            .invoke(json!({"input_field_1": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(error, WorkflowError::OutputValidation { .. }));
        assert!(strict.output().unwrap().is_none());
    }

    #[tokio::test]
    async fn surfaces_node_failures_with_the_node_name() {
        let mut node = summarizer(true);
        let input: BTreeMap<String, RecordInstance> = BTreeMap::new();
        let error = node
            .invoke(json!({"A": {"text": "x"}}))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "node summarizer failed: model unavailable");

        let error = node.invoke(input).await.unwrap_err();
        assert!(matches!(error, WorkflowError::InputValidation { .. }));
    }

    #[test]
    fn construction_is_fail_fast() {
        let error = NodeInstance::construct(Incomplete, Value::Null, ExecutionContext::empty())
            .unwrap_err();
        assert!(matches!(
            error,
            WorkflowError::SchemaDefinition {
                side: SchemaSide::Output,
                ..
            }
        ));

        let error = NodeInstance::construct(
            Greeter,
            json!({"input_schema": {"name": "str"}}),
            ExecutionContext::empty(),
        )
        .unwrap_err();
        assert!(error.to_string().contains("missing field `greeting`"));
    }

    #[test]
    fn default_visual_tag_follows_name() {
        let node = greeter();
        assert_eq!(node.visual_tag().acronym(), "G");
        assert_eq!(node.config().unwrap().greeting, "hello");
    }

    #[tokio::test]
    async fn passes_context_through() {
        let mut node = NodeInstance::construct(
            ContextReader,
            json!({}),
            ExecutionContext::new(String::from("run-42")),
        )
        .unwrap();
        let output = node.invoke(json!({"input_field_1": ""})).await.unwrap();
        assert_eq!(output.get("response"), Some(&json!("run-42")));
    }

    #[tokio::test]
    async fn boxed_instances_behave_the_same() {
        let mut node: Box<dyn DynNode> = Box::new(greeter());
        assert_eq!(node.name(), "greeter");
        let output = node.invoke(NodeInput::from(json!({"name": "cy"}))).await.unwrap();
        assert_eq!(output.get("text"), Some(&json!("hello cy")));
        assert!(node.output().unwrap().is_some());
    }
}
