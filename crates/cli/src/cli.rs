use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Document ingestion and semantic search over a vector store.
#[derive(Parser, Debug)]
#[command(name = "ragline", about = "Chunk documents, embed them, search them")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Collection name override (default comes from STORE_COLLECTION)
    #[arg(long, global = true)]
    pub collection: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest a file or a directory into the vector store
    Ingest {
        /// File or directory to ingest
        path: PathBuf,
    },

    /// Embed a query and print the closest stored chunks
    Search {
        query: String,

        /// Number of results to return
        #[arg(long, short = 'n', default_value = "5")]
        limit: usize,

        /// Exact-match metadata filter, repeatable: --filter file_type=md
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Print raw JSON instead of a readable listing
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from the stored documents (retrieve, then generate)
    Ask {
        question: String,

        /// Number of chunks to retrieve as context
        #[arg(long, short = 'n', default_value = "5")]
        context: usize,
    },

    /// List all collections
    Collections,

    /// Delete a collection and everything in it
    DeleteCollection { name: String },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}
