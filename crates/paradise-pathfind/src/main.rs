//! CLI entry point for the paradise-pathfind query service.
//!
//! `serve` runs the HTTP listener; `shortest` answers one query and writes
//! the JSON result to stdout.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use paradise_core::config::{load_section, DEFAULT_FILE_PREFIX};
use paradise_core::ExternalId;
use paradise_graph::{GraphClient, GraphConfig, GraphStore, Resolver, RetryPolicy};
use paradise_pathfind::config::ServeConfig;
use paradise_pathfind::server::{run_server, AppState};
use paradise_pathfind::PathfindEngine;

#[derive(Parser)]
#[command(name = "paradise-pathfind")]
#[command(about = "Shortest-path queries over the Paradise relationship graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: paradise).
    #[arg(short, long, default_value = DEFAULT_FILE_PREFIX, global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Serve path queries over HTTP.
    Serve {
        /// Listen address (overrides serve.bind).
        #[arg(long)]
        bind: Option<String>,
    },
    /// Compute the shortest path between two external ids.
    Shortest {
        /// Source external id.
        #[arg(long)]
        from: i64,
        /// Target external id.
        #[arg(long)]
        to: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { .. } => {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            fmt().with_env_filter(filter).json().init();
        }
        Command::Shortest { .. } => {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }

    let graph_config: GraphConfig = load_section(&cli.config, "neo4j")?;
    let client = GraphClient::connect(&graph_config).await?;

    let store: Arc<dyn GraphStore> = Arc::new(client);
    let engine = PathfindEngine::new(Resolver::from_config(store, &graph_config))
        .with_retry(RetryPolicy::from_config(&graph_config));

    match cli.command {
        Command::Serve { bind } => {
            let serve_config: ServeConfig = load_section(&cli.config, "serve")?;
            let bind = bind.unwrap_or(serve_config.bind);
            run_server(AppState::new(engine), &bind).await?;
        }
        Command::Shortest { from, to } => {
            let result = engine
                .shortest_path(ExternalId(from), ExternalId(to))
                .await?;
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}
