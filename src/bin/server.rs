//! HTTP server entrypoint. Process startup, logging setup, and config
//! loading are deliberately out of the core's scope (spec §1) but live
//! here as the thin outer shell.

use std::path::PathBuf;

use bi_query_assist::config::Config;
use bi_query_assist::http;
use bi_query_assist::orchestrator::Orchestrator;
use clap::Parser;

#[derive(Parser)]
#[command(name = "bi-query-server", version, about = "BI query-assistance suggestion service")]
struct Args {
    /// Path to a TOML config file. Falls back to defaults when absent.
    #[arg(long, env = "BI_QUERY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind the HTTP server to.
    #[arg(long, env = "BI_QUERY_BIND", default_value = "0.0.0.0:8080")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let orchestrator = Orchestrator::initialize(config);
    let app = http::router(orchestrator);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!(bind = %args.bind, "bi-query-server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
