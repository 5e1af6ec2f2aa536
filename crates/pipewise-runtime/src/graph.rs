//! Graph view over one workflow definition level.
//!
//! Orders nodes along their links, constructs them through a catalog and
//! checks that every link connects keys of the same type.

use std::collections::{HashMap, HashSet};
use std::fmt;

use derive_more::Display;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use pipewise_core::{FieldSchema, RecordType, Schema, TypeToken};

use crate::TRACING_TARGET_GRAPH;
use crate::catalog::NodeCatalog;
use crate::definition::{WorkflowDefinition, WorkflowLink, WorkflowNode};
use crate::error::{WorkflowError, WorkflowResult};
use crate::node::{DynNode, ExecutionContext};

/// Constructed nodes keyed by node id.
pub type NodeInstances = HashMap<String, Box<dyn DynNode>>;

/// Why a link does not type-check.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum MismatchReason {
    /// The source node's output type has no such field.
    #[display("source output `{_0}` is not declared")]
    MissingOutput(String),
    /// The target node's input type has no such field.
    #[display("target input `{_0}` is not declared")]
    MissingInput(String),
    /// Both fields exist with different types.
    #[display("output type `{output}` does not match input type `{input}`")]
    TypeMismatch {
        /// Type of the source output field.
        output: String,
        /// Type of the target input field.
        input: String,
    },
}

/// A link whose endpoints do not type-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMismatch {
    /// The offending link.
    pub link: WorkflowLink,
    /// What is wrong with it.
    pub reason: MismatchReason,
}

impl fmt::Display for LinkMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}: {}",
            self.link.source_id,
            self.link.source_output_key,
            self.link.target_id,
            self.link.target_input_key,
            self.reason
        )
    }
}

/// The nodes and links of one definition level as a directed acyclic graph.
///
/// Nested subworkflows are separate levels with their own graphs.
#[derive(Debug, Clone)]
pub struct WorkflowGraph<'a> {
    definition: &'a WorkflowDefinition,
    graph: DiGraph<&'a WorkflowNode, &'a WorkflowLink>,
    indices: HashMap<&'a str, NodeIndex>,
    order: Vec<NodeIndex>,
}

impl<'a> WorkflowGraph<'a> {
    /// Builds the graph of the top level of `definition`.
    ///
    /// Fails with [`WorkflowError::Cycle`] when the links form a cycle.
    pub fn new(definition: &'a WorkflowDefinition) -> WorkflowResult<Self> {
        let mut graph = DiGraph::with_capacity(definition.nodes().len(), definition.links().len());
        let mut indices = HashMap::with_capacity(definition.nodes().len());
        for node in definition.nodes() {
            indices.insert(node.id.as_str(), graph.add_node(node));
        }

        for link in definition.links() {
            // Validated definitions only link nodes of their own level.
            let (Some(&source), Some(&target)) = (
                indices.get(link.source_id.as_str()),
                indices.get(link.target_id.as_str()),
            ) else {
                continue;
            };
            graph.add_edge(source, target, link);
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| WorkflowError::Cycle(graph[cycle.node_id()].id.clone()))?;

        tracing::debug!(
            target: TRACING_TARGET_GRAPH,
            nodes = graph.node_count(),
            links = graph.edge_count(),
            "built workflow graph"
        );
        Ok(Self {
            definition,
            graph,
            indices,
            order,
        })
    }

    /// Returns the definition level this graph was built from.
    pub fn definition(&self) -> &'a WorkflowDefinition {
        self.definition
    }

    /// Returns the nodes so that every node comes after its predecessors.
    pub fn topological_order(&self) -> impl Iterator<Item = &'a WorkflowNode> + '_ {
        self.order.iter().map(|&index| self.graph[index])
    }

    /// Returns the ids of the nodes linked into `id`, in definition order.
    pub fn predecessors(&self, id: &str) -> Vec<&'a str> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Returns the ids of the nodes `id` links into, in definition order.
    pub fn successors(&self, id: &str) -> Vec<&'a str> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Returns the links ending at `id`.
    pub fn links_into(&self, id: &str) -> impl Iterator<Item = &'a WorkflowLink> + '_ {
        let index = self.indices.get(id).copied();
        index
            .into_iter()
            .flat_map(|index| self.graph.edges_directed(index, Direction::Incoming))
            .map(|edge| *edge.weight())
    }

    /// Constructs every node through `catalog`, in topological order.
    ///
    /// Nodes whose type has no loader in `catalog` are skipped; any other
    /// construction error is returned.
    pub fn instantiate(
        &self,
        catalog: &NodeCatalog,
        context: &ExecutionContext,
    ) -> WorkflowResult<NodeInstances> {
        let mut instances = NodeInstances::with_capacity(self.graph.node_count());
        for node in self.topological_order() {
            match catalog.create_node(&node.node_type, node.config_value(), context.clone()) {
                Ok(instance) => {
                    instances.insert(node.id.clone(), instance);
                }
                Err(WorkflowError::NodeUnavailable(node_type)) => {
                    tracing::debug!(
                        target: TRACING_TARGET_GRAPH,
                        node_id = %node.id,
                        %node_type,
                        "skipped node without loader"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET_GRAPH,
                        node_id = %node.id,
                        kind = error.kind(),
                        "failed to construct node"
                    );
                    return Err(error);
                }
            }
        }
        Ok(instances)
    }

    /// Checks every link between two constructed nodes.
    ///
    /// The source output field and the target input field must both be
    /// declared with the same type. All mismatches are reported together.
    pub fn check_links(&self, instances: &NodeInstances) -> WorkflowResult<()> {
        let mut mismatches = Vec::new();
        for link in self.definition.links() {
            let (Some(source), Some(target)) =
                (instances.get(&link.source_id), instances.get(&link.target_id))
            else {
                continue;
            };

            let output = source.output_model().field(&link.source_output_key);
            let input = target.input_model().field(&link.target_input_key);
            let reason = match (output, input) {
                (None, _) => Some(MismatchReason::MissingOutput(link.source_output_key.clone())),
                (_, None) => Some(MismatchReason::MissingInput(link.target_input_key.clone())),
                (Some(output), Some(input)) if output != input => Some(MismatchReason::TypeMismatch {
                    output: output.to_string(),
                    input: input.to_string(),
                }),
                _ => None,
            };
            if let Some(reason) = reason {
                mismatches.push(LinkMismatch {
                    link: link.clone(),
                    reason,
                });
            }
        }

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(WorkflowError::LinkMismatch(mismatches))
        }
    }

    /// Synthesizes the input type of `id` from its predecessors' outputs.
    ///
    /// Each predecessor contributes one field, named by its id and typed as
    /// its output record type.
    pub fn predecessor_input_type(
        &self,
        id: &str,
        instances: &NodeInstances,
    ) -> WorkflowResult<RecordType> {
        let mut schema = Schema::new();
        for predecessor in self.predecessors(id) {
            let instance = instances.get(predecessor).ok_or_else(|| {
                let node_type = self
                    .definition
                    .node(predecessor)
                    .map_or(predecessor, |node| node.node_type.as_str());
                WorkflowError::NodeUnavailable(node_type.to_owned())
            })?;
            schema.insert(FieldSchema::new(
                predecessor,
                TypeToken::Record(instance.output_model().clone()),
            ))?;
        }
        Ok(RecordType::synthesize(format!("{id}.predecessors"), &schema))
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&'a str> {
        let Some(&index) = self.indices.get(id) else {
            return Vec::new();
        };
        let linked: HashSet<NodeIndex> = self.graph.neighbors_directed(index, direction).collect();
        self.graph
            .node_indices()
            .filter(|candidate| linked.contains(candidate))
            .map(|candidate| self.graph[candidate].id.as_str())
            .collect()
    }
}
