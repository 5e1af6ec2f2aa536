//! Subcommands of the `pipewise` binary.
//!
//! Every command prints its report to stdout and returns an error when any
//! check fails, which makes the process exit with status 1.

mod catalog;
mod check_type;
mod validate;

use clap::Subcommand;

pub use self::catalog::CatalogArgs;
pub use self::check_type::CheckTypeArgs;
pub use self::validate::ValidateArgs;

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validates workflow definition files.
    Validate(ValidateArgs),
    /// Lists the known node types by category.
    Catalog(CatalogArgs),
    /// Checks node type names, following deprecated aliases.
    CheckType(CheckTypeArgs),
}

impl Command {
    /// Runs the subcommand.
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Command::Validate(args) => args.execute().await,
            Command::Catalog(args) => args.execute(),
            Command::CheckType(args) => args.execute(),
        }
    }
}
