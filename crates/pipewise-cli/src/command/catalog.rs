use anyhow::Context;
use clap::Args;
use pipewise_runtime::catalog::NodeCatalog;

/// Arguments of `pipewise catalog`.
#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Prints the listing as JSON.
    #[arg(long)]
    pub json: bool,
}

impl CatalogArgs {
    pub fn execute(self) -> anyhow::Result<()> {
        let catalog = NodeCatalog::global();
        let output = if self.json {
            serde_json::to_string_pretty(&catalog.list_all())
                .context("failed to serialize the catalog")?
        } else {
            render_text(catalog)
        };
        println!("{output}");
        Ok(())
    }
}

fn render_text(catalog: &NodeCatalog) -> String {
    let mut lines = Vec::new();
    for (category, types) in catalog.list_all().iter() {
        lines.push(format!("{category}:"));
        lines.extend(types.iter().map(|summary| {
            format!(
                "  {:<28} {}::{}",
                summary.type_name, summary.module_reference, summary.class_reference
            )
        }));
    }

    if !catalog.deprecated().is_empty() {
        lines.push("deprecated:".to_owned());
        lines.extend(catalog.deprecated().iter().map(|deprecated| {
            format!(
                "  {:<28} -> {}",
                deprecated.descriptor().type_name(),
                deprecated.replacement()
            )
        }));
    }
    lines.join("\n")
}
