//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docchat",
    version,
    about = "Conversational question answering over a document corpus",
    long_about = "Docchat answers questions grounded in a corpus of page-tagged text chunks by \
                  combining keyword and vector retrieval with reciprocal rank fusion. The binary \
                  exposes retrieval inspection and configuration management; the conversational \
                  pipeline is the library API."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/docchat/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a hybrid retrieval query against a corpus and print fused results
    Search {
        /// Query text
        query: String,

        /// Path to the corpus file (JSON array of {"text", "page"} records)
        #[arg(short = 'f', long, value_name = "FILE")]
        corpus: PathBuf,

        /// Maximum number of fused results (overrides retrieval.fused_top_k)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
