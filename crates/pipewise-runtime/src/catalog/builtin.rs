//! Node types known to every pipewise process.

use super::descriptor::{NodeTypeDescriptor, load};
use super::NodeCatalogBuilder;
use crate::node::primitive::{InputNode, OutputNode, StaticValueNode};

const PRIMITIVES: &str = "primitives";
const PRIMITIVES_MODULE: &str = "pipewise_runtime::node::primitive";

/// `(category, type name, module)` of supported types implemented elsewhere.
const EXTERNAL: [(&str, &str, &str); 12] = [
    ("json", "JsonifyNode", "nodes::json::jsonify"),
    ("json", "ExtractJsonNode", "nodes::json::extract_json"),
    ("json", "PickOneNode", "nodes::json::pick_one"),
    ("llm", "SingleLLMCallNode", "nodes::llm::single_llm_call"),
    ("llm", "MCTSNode", "nodes::llm::mcts"),
    ("llm", "BestOfNNode", "nodes::llm::generative::best_of_n"),
    ("llm", "BranchSolveMergeNode", "nodes::llm::generative::branch_solve_merge"),
    ("llm", "MixtureOfAgentsNode", "nodes::llm::mixture_of_agents"),
    ("llm", "SelfConsistencyNode", "nodes::llm::self_consistency"),
    ("llm", "TreeOfThoughtsNode", "nodes::llm::tree_of_thoughts"),
    ("loops", "FixedIterationLoopNode", "nodes::loops::fixed_iteration_loop"),
    ("python", "PythonFuncNode", "nodes::python::python_func"),
];

/// `(type name, module, class, replacement)` of deprecated types.
const DEPRECATED: [(&str, &str, &str, &str); 5] = [
    ("StringOutputLLMNode", "nodes::llm::string_output_llm", "StringOutputLLMNode", "SingleLLMCallNode"),
    ("StructuredOutputNode", "nodes::llm::structured_output", "StructuredOutputNode", "SingleLLMCallNode"),
    ("AdvancedLLMNode", "nodes::llm::single_llm_call", "SingleLLMCallNode", "SingleLLMCallNode"),
    ("SampleLLMNode", "nodes::llm::sample_llm", "SampleLLMNode", "SingleLLMCallNode"),
    ("SubworkflowNode", "nodes::subworkflow", "SubworkflowNode", "FixedIterationLoopNode"),
];

/// Registers the built-in node types, primitives first.
pub(super) fn register(builder: NodeCatalogBuilder) -> NodeCatalogBuilder {
    let builder = builder
        .register(
            NodeTypeDescriptor::new("InputNode", PRIMITIVES, PRIMITIVES_MODULE, "InputNode")
                .with_loader(load::<InputNode>),
        )
        .register(
            NodeTypeDescriptor::new("OutputNode", PRIMITIVES, PRIMITIVES_MODULE, "OutputNode")
                .with_loader(load::<OutputNode>),
        )
        .register(
            NodeTypeDescriptor::new(
                "StaticValueNode",
                PRIMITIVES,
                PRIMITIVES_MODULE,
                "StaticValueNode",
            )
            .with_loader(load::<StaticValueNode>),
        );

    let builder = EXTERNAL
        .into_iter()
        .fold(builder, |builder, (category, type_name, module)| {
            builder.register(NodeTypeDescriptor::new(type_name, category, module, type_name))
        });

    DEPRECATED
        .into_iter()
        .fold(builder, |builder, (type_name, module, class, replacement)| {
            builder.deprecate(
                NodeTypeDescriptor::new(type_name, "deprecated", module, class),
                replacement,
            )
        })
}
