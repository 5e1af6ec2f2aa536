//! Workflow error types.

use pipewise_core::{BoxedError, SchemaError, ValidationError};
use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::definition::Violations;
use crate::graph::LinkMismatch;

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Which of a node's two shapes an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SchemaSide {
    /// The input record type.
    Input,
    /// The output record type.
    Output,
}

/// Errors that can occur while building, validating or invoking workflows.
#[derive(Debug, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowError {
    /// The node's config does not match its schema variant.
    #[error("invalid config for node {node}: {message}")]
    ConfigShape {
        /// Name of the node.
        node: String,
        /// What is wrong with the config.
        message: String,
    },

    /// A node implementation left a fixed schema undeclared.
    #[error("node {node} must declare a non-empty fixed {side} schema")]
    SchemaDefinition {
        /// Name of the node.
        node: String,
        /// The side whose schema is missing.
        side: SchemaSide,
    },

    /// An invocation input did not match the node's input type.
    #[error("invalid input for node {node}: {source}")]
    InputValidation {
        /// Name of the node.
        node: String,
        /// Every violation found in the input.
        source: ValidationError,
    },

    /// A node produced a value that does not match its output type.
    #[error("invalid output from node {node}: {source}")]
    OutputValidation {
        /// Name of the node.
        node: String,
        /// Every violation found in the output.
        source: ValidationError,
    },

    /// The node's own logic failed.
    #[error("node {node} failed: {source}")]
    NodeFailed {
        /// Name of the node.
        node: String,
        /// The error reported by the implementation.
        source: BoxedError,
    },

    /// A workflow definition violates one or more structural rules.
    #[error("{0}")]
    GraphInvariant(Violations),

    /// The node type is neither supported nor deprecated.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// The node type is known but no loader is registered for it.
    #[error("no loader registered for node type {0}")]
    NodeUnavailable(String),

    /// A catalog was assembled from inconsistent entries.
    #[error("invalid node catalog: {0}")]
    InvalidCatalog(String),

    /// A visual tag carries an invalid acronym or color.
    #[error("invalid visual tag: {0}")]
    InvalidVisualTag(String),

    /// The links of one definition level form a cycle.
    #[error("workflow links form a cycle through node {0}")]
    Cycle(String),

    /// Links connect keys whose types do not match.
    #[error("{} incompatible link(s): {}", .0.len(), join_mismatches(.0))]
    LinkMismatch(Vec<LinkMismatch>),

    /// A schema declaration is invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkflowError {
    /// Returns the snake_case name of the error kind, for log fields.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Returns the name of the node the error is tagged with, if any.
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::ConfigShape { node, .. }
            | Self::SchemaDefinition { node, .. }
            | Self::InputValidation { node, .. }
            | Self::OutputValidation { node, .. }
            | Self::NodeFailed { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Returns the structural violations of a rejected definition.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::GraphInvariant(violations) => Some(violations),
            _ => None,
        }
    }
}

fn join_mismatches(mismatches: &[LinkMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
