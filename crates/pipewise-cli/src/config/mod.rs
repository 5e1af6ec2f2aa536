//! Command-line configuration.
//!
//! Options are read from arguments first, then from `PIPEWISE_*` environment
//! variables. With the `dotenv` feature a `.env` file in the working
//! directory is loaded before parsing.

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_STARTUP;
use crate::command::Command;

/// Output format of log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Validates and inspects pipewise workflow definitions.
#[derive(Debug, Parser)]
#[command(name = "pipewise")]
#[command(about = "Validates and inspects pipewise workflow definitions")]
#[command(version)]
pub struct Cli {
    /// Format of log events written to stderr.
    #[arg(
        long,
        global = true,
        env = "PIPEWISE_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads `.env` when enabled, then parses the command line.
    pub fn init() -> Self {
        load_dotenv();
        Self::parse()
    }

    /// Logs the binary's version and compiled features.
    pub fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            features = ?Self::enabled_features(),
            "pipewise starting"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Installs the global subscriber.
///
/// Events go to stderr so command output on stdout stays machine-readable.
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[cfg(feature = "dotenv")]
fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        eprintln!("Warning: failed to load .env file: {err}");
    }
}

#[cfg(not(feature = "dotenv"))]
fn load_dotenv() {}
