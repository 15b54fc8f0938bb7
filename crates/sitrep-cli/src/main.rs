use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sitrep-cli")]
#[command(about = "Conflict event ingestion command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one ingestion batch against the live news index.
    Ingest {
        /// How many index pages to scan; defaults to the configured count.
        #[arg(long)]
        pages: Option<u32>,
        /// Assemble and log records without writing them to the database.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = sitrep_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Ingest { pages, dry_run } => run_ingest(&config, pages, dry_run).await,
    }
}

async fn run_ingest(
    config: &sitrep_core::AppConfig,
    pages: Option<u32>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut ingest_config = sitrep_ingest::IngestConfig::from_app_config(config);
    if let Some(pages) = pages {
        ingest_config.index_pages = pages;
    }

    let records = sitrep_ingest::run_ingest(&ingest_config).await?;
    tracing::info!(records = records.len(), "ingestion batch assembled");

    if dry_run {
        for record in &records {
            tracing::info!(
                event_date = %record.event_date,
                event_type = %record.event_type,
                location = record.location.as_deref().unwrap_or("-"),
                fatalities = record.fatalities,
                url = %record.source_url,
                "dry run: record not written"
            );
        }
        return Ok(());
    }

    let pool_config = sitrep_db::PoolConfig::from_app_config(config);
    let pool = sitrep_db::connect_pool(&config.database_url, pool_config).await?;
    sitrep_db::run_migrations(&pool).await?;

    let written = sitrep_db::write_events(&pool, &records).await;
    tracing::info!(
        assembled = records.len(),
        written,
        "event records written"
    );
    Ok(())
}
