use std::fmt::Display;
use std::fs;
use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use pipewise_runtime::WorkflowError;
use pipewise_runtime::catalog::NodeCatalog;
use pipewise_runtime::definition::{INPUT_NODE_TYPE, WorkflowDefinition};
use pipewise_runtime::graph::{NodeInstances, WorkflowGraph};
use pipewise_runtime::node::{ExecutionContext, NodeInput};

use crate::TRACING_TARGET_COMMAND;

/// Arguments of `pipewise validate`.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Workflow definition files in JSON.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Also constructs the nodes that have loaders, type-checks their links
    /// and runs the test inputs through the input node.
    #[arg(long)]
    pub instantiate: bool,
}

impl ValidateArgs {
    pub async fn execute(self) -> anyhow::Result<()> {
        let mut failed = 0usize;

        for path in &self.files {
            let report = match fs::read_to_string(path) {
                Ok(source) => check_source(&source, self.instantiate).await,
                Err(error) => Report::failed(format!("failed to read file: {error}")),
            };

            tracing::debug!(
                target: TRACING_TARGET_COMMAND,
                path = %path.display(),
                problems = report.problems.len(),
                "validated workflow file"
            );
            if !report.is_valid() {
                failed += 1;
            }
            print!("{}", report.render(&path.display().to_string()));
        }

        if failed > 0 {
            bail!(
                "{failed} of {} workflow file(s) failed validation",
                self.files.len()
            );
        }
        Ok(())
    }
}

/// Outcome of checking one workflow file.
#[derive(Debug, Default)]
struct Report {
    nodes: usize,
    links: usize,
    instantiated: Option<usize>,
    problems: Vec<String>,
}

impl Report {
    fn failed(problem: String) -> Self {
        Self {
            problems: vec![problem],
            ..Self::default()
        }
    }

    fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    fn problem(&mut self, location: &[String], message: impl Display) {
        if location.is_empty() {
            self.problems.push(message.to_string());
        } else {
            self.problems
                .push(format!("in {}: {message}", location.join(" > ")));
        }
    }

    fn render(&self, name: &str) -> String {
        if !self.is_valid() {
            let mut out = format!("FAIL {name}\n");
            for problem in &self.problems {
                out.push_str(&format!("  - {problem}\n"));
            }
            return out;
        }

        match self.instantiated {
            Some(instantiated) => format!(
                "ok   {name} ({} nodes, {} links, {instantiated} instantiated)\n",
                self.nodes, self.links
            ),
            None => format!("ok   {name} ({} nodes, {} links)\n", self.nodes, self.links),
        }
    }
}

async fn check_source(source: &str, instantiate: bool) -> Report {
    let definition = match WorkflowDefinition::from_json(source) {
        Ok(definition) => definition,
        Err(WorkflowError::GraphInvariant(violations)) => {
            return Report {
                problems: violations.iter().map(ToString::to_string).collect(),
                ..Report::default()
            };
        }
        Err(error) => return Report::failed(error.to_string()),
    };

    let mut report = Report {
        nodes: definition.nodes().len(),
        links: definition.links().len(),
        ..Report::default()
    };
    if !instantiate {
        return report;
    }

    report.instantiated = Some(0);
    if let Some(mut instances) = instantiate_level(&definition, &[], &mut report) {
        check_test_inputs(&definition, &mut instances, &mut report).await;
    }
    instantiate_nested(&definition, &mut Vec::new(), &mut report);
    report
}

/// Builds the graph of one level, constructs its nodes and checks its links.
fn instantiate_level(
    definition: &WorkflowDefinition,
    location: &[String],
    report: &mut Report,
) -> Option<NodeInstances> {
    let graph = match WorkflowGraph::new(definition) {
        Ok(graph) => graph,
        Err(error) => {
            report.problem(location, error);
            return None;
        }
    };

    let instances = match graph.instantiate(NodeCatalog::global(), &ExecutionContext::empty()) {
        Ok(instances) => instances,
        Err(error) => {
            report.problem(location, error);
            return None;
        }
    };
    if let Some(count) = report.instantiated.as_mut() {
        *count += instances.len();
    }

    match graph.check_links(&instances) {
        Ok(()) => {}
        Err(WorkflowError::LinkMismatch(mismatches)) => {
            for mismatch in mismatches {
                report.problem(location, mismatch);
            }
        }
        Err(error) => report.problem(location, error),
    }
    Some(instances)
}

fn instantiate_nested(
    definition: &WorkflowDefinition,
    location: &mut Vec<String>,
    report: &mut Report,
) {
    for (id, nested) in definition.subworkflows() {
        location.push(id.to_owned());
        instantiate_level(nested, location, report);
        instantiate_nested(nested, location, report);
        location.pop();
    }
}

/// Runs every test input through the workflow's input node.
async fn check_test_inputs(
    definition: &WorkflowDefinition,
    instances: &mut NodeInstances,
    report: &mut Report,
) {
    let Some(input_node) = definition.root_nodes_of_type(INPUT_NODE_TYPE).next() else {
        return;
    };
    let Some(node) = instances.get_mut(&input_node.id) else {
        return;
    };

    for (index, input) in definition.test_inputs().iter().enumerate() {
        if let Err(error) = node.invoke(NodeInput::from(input.clone())).await {
            report.problem(&[], format_args!("test input {index}: {error}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn workflow(test_input: Value, output_type: &str) -> String {
        json!({
            "nodes": [
                {
                    "id": "in",
                    "node_type": "InputNode",
                    "config": {"input_schema": {"text": "str"}},
                },
                {
                    "id": "out",
                    "node_type": "OutputNode",
                    "config": {"output_schema": {"text": output_type}},
                },
            ],
            "links": [
                {
                    "source_id": "in",
                    "source_output_key": "text",
                    "target_id": "out",
                    "target_input_key": "text",
                },
            ],
            "test_inputs": [test_input],
        })
        .to_string()
    }

    #[tokio::test]
    async fn accepts_a_valid_workflow() {
        let source = workflow(json!({"text": "hello"}), "str");

        let report = check_source(&source, false).await;
        assert!(report.is_valid());
        assert_eq!(report.render("wf.json"), "ok   wf.json (2 nodes, 1 links)\n");

        let report = check_source(&source, true).await;
        assert!(report.is_valid(), "{:?}", report.problems);
        assert_eq!(report.instantiated, Some(2));
    }

    #[tokio::test]
    async fn reports_every_structural_violation() {
        let source = json!({
            "nodes": [
                {"id": "a", "node_type": "Mystery"},
                {"id": "a", "node_type": "OutputNode"},
            ],
        })
        .to_string();

        let report = check_source(&source, true).await;
        assert!(!report.is_valid());
        assert!(report.problems.len() >= 3, "{:?}", report.problems);
        assert!(report.render("wf.json").starts_with("FAIL wf.json\n  - "));
    }

    #[tokio::test]
    async fn instantiate_finds_link_type_mismatches() {
        let source = workflow(json!({"text": "hello"}), "int");

        assert!(check_source(&source, false).await.is_valid());
        let report = check_source(&source, true).await;
        assert_eq!(report.problems.len(), 1);
        assert!(report.problems[0].starts_with("in.text -> out.text"));
    }

    #[tokio::test]
    async fn instantiate_checks_test_inputs() {
        let source = workflow(json!({"text": 5}), "str");

        let report = check_source(&source, true).await;
        assert_eq!(report.problems.len(), 1);
        assert!(report.problems[0].starts_with("test input 0: invalid input for node"));
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let report = check_source("{not json", false).await;
        assert_eq!(report.problems.len(), 1);
    }
}
