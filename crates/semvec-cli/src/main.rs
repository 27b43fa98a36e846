//! Semvec CLI - command-line client for the Semvec API
//!
//! Usage:
//!   semvec health
//!   semvec embed "안녕하세요"
//!   semvec collection create documents --dimension 1024
//!   semvec collection list
//!   semvec collection delete documents
//!   semvec insert documents --file items.json
//!   cat items.json | semvec insert documents --auto-embed false
//!   semvec search documents "인사말" --limit 3

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "semvec")]
#[command(about = "Embedding and vector search service CLI")]
#[command(version)]
struct Cli {
    /// Base URL of the running API server
    #[arg(long, global = true, default_value = "http://localhost:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// Embed a single text
    Embed {
        /// Text to embed
        text: String,
    },
    /// Manage collections
    Collection {
        #[command(subcommand)]
        action: CollectionAction,
    },
    /// Insert records from an items JSON array
    Insert {
        /// Collection name
        collection: String,
        /// Path to a JSON array of items; reads stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
        /// Embed item texts server-side; pass false when items carry vectors
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        auto_embed: bool,
    },
    /// Search a collection by query text
    Search {
        /// Collection name
        collection: String,
        /// Query text
        query: String,
        /// Maximum number of hits
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Only return hits with this category
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum CollectionAction {
    /// Create a collection
    Create {
        name: String,
        /// Vector dimension; defaults to the server's model dimension
        #[arg(long)]
        dimension: Option<usize>,
    },
    /// List collections
    List,
    /// Delete a collection
    Delete { name: String },
}

/// Read the insert items array from a file or stdin.
fn read_items(file: Option<PathBuf>) -> anyhow::Result<Value> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read items from stdin")?;
            buffer
        }
    };

    let items: Value = serde_json::from_str(&raw).context("Items are not valid JSON")?;
    if !items.is_array() {
        anyhow::bail!("Items must be a JSON array");
    }
    Ok(items)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    let response = match cli.command {
        Commands::Health => client.get(format!("{server}/health")).send().await?,
        Commands::Embed { text } => {
            client
                .post(format!("{server}/embed"))
                .json(&json!({ "text": text }))
                .send()
                .await?
        }
        Commands::Collection { action } => match action {
            CollectionAction::Create { name, dimension } => {
                let mut body = json!({ "name": name });
                if let Some(dimension) = dimension {
                    body["dimension"] = dimension.into();
                }
                client
                    .post(format!("{server}/collection/create"))
                    .json(&body)
                    .send()
                    .await?
            }
            CollectionAction::List => {
                client
                    .get(format!("{server}/collection/list"))
                    .send()
                    .await?
            }
            CollectionAction::Delete { name } => {
                client
                    .delete(format!("{server}/collection/{name}"))
                    .send()
                    .await?
            }
        },
        Commands::Insert {
            collection,
            file,
            auto_embed,
        } => {
            let items = read_items(file)?;
            client
                .post(format!("{server}/collection/{collection}/insert"))
                .json(&json!({ "items": items, "auto_embed": auto_embed }))
                .send()
                .await?
        }
        Commands::Search {
            collection,
            query,
            limit,
            category,
        } => {
            let mut body = json!({ "query": query, "limit": limit });
            if let Some(category) = category {
                body["filter"] = json!({ "category": category });
            }
            client
                .post(format!("{server}/collection/{collection}/search"))
                .json(&body)
                .send()
                .await?
        }
    };

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .context("Server returned a non-JSON response")?;

    if !status.is_success() {
        eprintln!("{}", serde_json::to_string_pretty(&body)?);
        anyhow::bail!("Request failed with status {status}");
    }

    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}
