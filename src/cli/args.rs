//! Command line argument parsing for Colloquy CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Colloquy - A trainable canned-response engine
#[derive(Parser, Debug, Clone)]
#[command(name = "colloquy")]
#[command(about = "A trainable canned-response engine for chat assistants")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Colloquy Contributors")]
#[command(long_about = None)]
pub struct ColloquyArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Engine configuration file (JSON)
    #[arg(long, value_name = "CONFIG_FILE", env = "COLLOQUY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seed exemplars file (JSON array of {"input", "response"} objects)
    #[arg(long, value_name = "SEED_FILE")]
    pub seed: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ColloquyArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Answer one or more utterances
    Ask(AskArgs),

    /// Interactive session over stdin
    Chat(ChatArgs),

    /// Show engine statistics
    Stats(StatsArgs),
}

/// Arguments for answering utterances
#[derive(Parser, Debug, Clone)]
pub struct AskArgs {
    /// Utterances to answer
    #[arg(value_name = "TEXT", required = true)]
    pub texts: Vec<String>,

    /// Teach a pair before answering (repeatable)
    #[arg(short, long = "teach", value_name = "INPUT=RESPONSE", value_parser = parse_teach_pair)]
    pub teach: Vec<(String, String)>,
}

/// Arguments for an interactive session
#[derive(Parser, Debug, Clone)]
pub struct ChatArgs {
    /// Prompt printed before each line
    #[arg(long, default_value = "> ")]
    pub prompt: String,

    /// Print the answering tier next to each response
    #[arg(long)]
    pub show_tier: bool,
}

/// Arguments for showing statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Teach a pair before reporting (repeatable)
    #[arg(short, long = "teach", value_name = "INPUT=RESPONSE", value_parser = parse_teach_pair)]
    pub teach: Vec<(String, String)>,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Parse an `INPUT=RESPONSE` pair. Splits on the first `=`.
pub fn parse_teach_pair(s: &str) -> Result<(String, String), String> {
    let (input, response) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INPUT=RESPONSE, got '{s}'"))?;

    if input.trim().is_empty() || response.trim().is_empty() {
        return Err(format!("both sides of '{s}' must be non-empty"));
    }

    Ok((input.trim().to_string(), response.trim().to_string()))
}
