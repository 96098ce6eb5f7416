//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use eyre::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// tp - drive the trip planning engine from event scripts
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Replay trip-planning events and inspect widget decisions",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Feed a list of events through a fresh session
    Replay {
        /// JSON or YAML file holding a list of events
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the next widget for a TripFacts document
    Resolve {
        /// JSON or YAML file holding TripFacts
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for command results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use 'text' or 'json'", s)),
        }
    }
}

/// Read a JSON or YAML document, picking the parser from the extension
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "read_document: called");
    let content = std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).context(format!("Failed to parse JSON in {}", path.display()))
    } else {
        serde_yaml::from_str(&content).context(format!("Failed to parse YAML in {}", path.display()))
    }
}
