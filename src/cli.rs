use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "semdex",
    about = "Semantic file search powered by remote embeddings"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the embedding model name
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Override the embedding endpoint URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest files into the document store
    Add(AddArgs),
    /// Embed every document still lacking an embedding
    Embed(EmbedArgs),
    /// Search documents by semantic similarity
    Search(SearchArgs),
    /// List all stored documents
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove documents by id
    Remove {
        /// Document ids to remove
        ids: Vec<String>,
    },
    /// Remove all documents
    Clear,
    /// Show store statistics
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, clap::Args)]
pub struct AddArgs {
    /// Files to ingest
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct EmbedArgs {
    /// Documents embedded concurrently per batch
    #[arg(long, default_value_t = 6)]
    pub batch_size: usize,
}

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
    /// The query; omit it with --live to read queries from stdin
    pub query: Option<String>,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Read query lines from stdin, re-ranking as they change
    #[arg(long)]
    pub live: bool,
}
