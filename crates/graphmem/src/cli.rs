//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};
use graphmem_sdk::CaptureTrigger;
use std::path::PathBuf;

/// Knowledge graph memory CLI
///
/// Inspect a temporal knowledge-graph service and run the recall and capture
/// pipelines by hand.
#[derive(Parser, Debug)]
#[command(name = "graphmem")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: platform config dir, or $GRAPHMEM_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the service URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Override the group namespace
    #[arg(short, long, global = true)]
    pub group: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check service health and show recent episodes
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Search facts
    Search {
        /// Search query
        query: String,

        /// Maximum facts to return
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Submit content as a new episode
    Ingest {
        /// Content to remember
        content: String,

        /// Episode name (default: manual-<millis>)
        #[arg(short, long)]
        name: Option<String>,

        /// Source description (default: manual ingest)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// List the most recent episodes
    Episodes {
        /// Number of episodes
        #[arg(short, long, default_value = "10")]
        last: usize,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Facts relevant to a piece of conversation (get-memory)
    Context {
        /// Conversation text
        text: String,

        /// Maximum facts to return
        #[arg(short, long, default_value = "10")]
        max_facts: usize,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Run the recall pipeline for a prompt and print the injected block
    Recall {
        /// Prompt as the agent would receive it
        prompt: String,
    },

    /// Run a capture trigger over a JSON transcript
    Capture {
        /// Transcript file: an array of {role, content} turns, or {"messages": [...]}
        file: PathBuf,

        /// Trigger policy: compaction, reset or turn_end
        #[arg(short, long, default_value = "compaction")]
        trigger: CaptureTrigger,

        /// Build and print the episode without submitting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or initialize configuration
    Config {
        /// Print only the config file path
        #[arg(long)]
        path: bool,

        /// Write a default config file if none exists
        #[arg(long, conflicts_with = "path")]
        init: bool,
    },
}
