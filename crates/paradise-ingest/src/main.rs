//! CLI entry point for the paradise-ingest loader.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use paradise_core::config::{load_section, DEFAULT_FILE_PREFIX};
use paradise_graph::{GraphClient, GraphConfig, GraphStore, MaterializeMode, Resolver};

use paradise_ingest::config::{ErrorPolicy, IngestConfig};
use paradise_ingest::{IngestPlan, Ingestor, SqliteSource};

#[derive(Parser)]
#[command(name = "paradise-ingest")]
#[command(about = "Load offshore-leak tables from SQLite into the Paradise graph")]
struct Cli {
    /// SQLite database to read (overrides ingest.sqlite_path).
    #[arg(short, long)]
    sqlite: Option<String>,

    /// Row error policy: fail-fast, isolate.
    #[arg(short, long)]
    policy: Option<ErrorPolicy>,

    /// Upsert nodes on their external id instead of always creating them.
    #[arg(long)]
    merge: bool,

    /// Skip the index declaration step.
    #[arg(long)]
    no_schema: bool,

    /// Only ingest these tables (repeatable).
    #[arg(short, long = "table")]
    tables: Vec<String>,

    /// Config file prefix (default: paradise).
    #[arg(short, long, default_value = DEFAULT_FILE_PREFIX)]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let ingest_config = apply_overrides(load_section::<IngestConfig>(&cli.config, "ingest")?, &cli);
    let graph_config: GraphConfig = load_section(&cli.config, "neo4j")?;

    let client = GraphClient::connect(&graph_config).await?;
    let store: Arc<dyn GraphStore> = Arc::new(client);

    if ingest_config.apply_schema {
        store.apply_schema().await?;
        tracing::info!("Schema applied");
    }

    let mut plan = IngestPlan::from_config(&ingest_config)?;
    if !cli.tables.is_empty() {
        plan = plan.retain(&cli.tables);
    }

    let source = SqliteSource::new(&ingest_config.sqlite_path);
    let ingestor = Ingestor::new(Resolver::from_config(store, &graph_config))
        .with_policy(ingest_config.error_policy)
        .with_mode(ingest_config.materialize_mode);

    tracing::info!(
        sqlite = %ingest_config.sqlite_path,
        policy = ?ingest_config.error_policy,
        mode = ?ingest_config.materialize_mode,
        "Starting ingestion"
    );
    let report = ingestor.run(&source, &plan).await?;

    for table in report.tables.iter().filter(|t| !t.failures.is_empty()) {
        for failure in &table.failures {
            tracing::warn!(table = %table.table, row = failure.row, reason = %failure.reason, "Skipped row");
        }
    }
    if report.failures() > 0 {
        anyhow::bail!("{} rows failed to ingest", report.failures());
    }

    Ok(())
}

fn apply_overrides(mut config: IngestConfig, cli: &Cli) -> IngestConfig {
    if let Some(path) = &cli.sqlite {
        config.sqlite_path = path.clone();
    }
    if let Some(policy) = cli.policy {
        config.error_policy = policy;
    }
    if cli.merge {
        config.materialize_mode = MaterializeMode::MergeOnExternalId;
    }
    if cli.no_schema {
        config.apply_schema = false;
    }
    config
}
