use anyhow::bail;
use clap::Args;
use pipewise_runtime::catalog::NodeCatalog;

use crate::TRACING_TARGET_COMMAND;

/// Arguments of `pipewise check-type`.
#[derive(Debug, Args)]
pub struct CheckTypeArgs {
    /// Node type names as used in workflow definitions.
    #[arg(required = true, value_name = "NAME")]
    pub names: Vec<String>,
}

/// What the catalog knows about a node type name.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeStatus {
    Supported { category: String },
    Deprecated { replacement: String },
    Unknown,
}

impl TypeStatus {
    fn of(catalog: &NodeCatalog, name: &str) -> Self {
        if let Some(replacement) = catalog.replacement_of(name) {
            return Self::Deprecated {
                replacement: replacement.to_owned(),
            };
        }
        match catalog.resolve(name) {
            Ok(descriptor) => Self::Supported {
                category: descriptor.category().to_owned(),
            },
            Err(_) => Self::Unknown,
        }
    }

    fn describe(&self, name: &str) -> String {
        match self {
            Self::Supported { category } => format!("{name}: supported ({category})"),
            Self::Deprecated { replacement } => {
                format!("{name}: deprecated, resolves to {replacement}")
            }
            Self::Unknown => format!("{name}: unknown node type"),
        }
    }
}

impl CheckTypeArgs {
    pub fn execute(self) -> anyhow::Result<()> {
        let catalog = NodeCatalog::global();
        let mut unknown = 0usize;

        for name in &self.names {
            let status = TypeStatus::of(catalog, name);
            if status == TypeStatus::Unknown {
                unknown += 1;
            }
            tracing::debug!(target: TRACING_TARGET_COMMAND, node_type = %name, ?status, "checked node type");
            println!("{}", status.describe(name));
        }

        if unknown > 0 {
            bail!("{unknown} of {} node type(s) are unknown", self.names.len());
        }
        Ok(())
    }
}
