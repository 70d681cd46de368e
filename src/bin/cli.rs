//! Command-line client for exercising the engine without the HTTP shell,
//! following the teacher's `laurus-cli` derive-based command layout
//! (`Cli` -> `Command` -> per-resource subcommands).

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bi_query_assist::config::Config;
use bi_query_assist::orchestrator::Orchestrator;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bi-query-cli", version, about = "BI query-assistance engine CLI")]
struct Cli {
    /// Path to a TOML config file. Falls back to defaults when absent.
    #[arg(long, env = "BI_QUERY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request autocomplete suggestions for a query.
    Suggest {
        query: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Find semantically similar queries.
    Similar {
        query: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Find contextually related queries.
    Related {
        query: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Record a user's selection for personalization and sequence learning.
    Feedback {
        query: String,
        selected: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Add a document to the index.
    AddDocument {
        text: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path).context("failed to load config")?,
        None => Config::default(),
    };
    let orchestrator = Orchestrator::initialize(config);

    match cli.command {
        Command::Suggest { query, user, limit } => {
            let suggestions = orchestrator
                .get_suggestions(&query, user.as_deref(), limit, None, None)
                .await?;
            print_suggestions(&suggestions);
        }
        Command::Similar { query, user, limit } => {
            let suggestions = orchestrator.get_similar_queries(&query, user.as_deref(), limit).await?;
            print_suggestions(&suggestions);
        }
        Command::Related { query, user, limit } => {
            let suggestions = orchestrator.get_related_queries(&query, user.as_deref(), limit).await?;
            print_suggestions(&suggestions);
        }
        Command::Feedback { query, selected, user } => {
            orchestrator.record_feedback(&query, &selected, user.as_deref(), None).await?;
            println!("feedback recorded");
        }
        Command::AddDocument { text, id, keywords } => {
            let keywords: HashSet<String> = keywords.into_iter().collect();
            let doc_id = orchestrator.add_document(&text, id, keywords, Default::default()).await?;
            println!("document added: {doc_id}");
        }
    }

    Ok(())
}

fn print_suggestions(suggestions: &[bi_query_assist::data::Suggestion]) {
    for s in suggestions {
        println!("{:>6.3}  {:<12}  {}", s.score, s.source.as_str(), s.text);
    }
}
