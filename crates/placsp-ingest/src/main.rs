//! PLACSP ingestion tool

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use placsp_common::logging::{init_logging, LogConfig, LogLevel};
use placsp_ingest::contract_types::init_contract_types;
use placsp_ingest::{ContractStorage, IngestConfig, IngestOrchestrator};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "placsp-ingest")]
#[command(author, version, about = "PLACSP procurement feed ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Ingest every unprocessed feed file under the input directory
    Ingest {
        /// Directory to scan for feed files (overrides PLACSP_INPUT_DIR)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show row counts for contracts and processed files
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    // Environment variables take precedence over the CLI flag, field by field
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("placsp-ingest".to_string())
        .build()
        .merge_env()?;
    init_logging(&log_config)?;

    let mut config = IngestConfig::load()?;

    match cli.command {
        Command::Ingest { input } => {
            if let Some(input) = input {
                config.input_dir = input;
            }

            let pool = config.connect().await?;
            let storage = ContractStorage::new(pool.clone());
            storage.run_migrations().await?;
            init_contract_types(&pool).await?;

            let cancel = CancellationToken::new();
            let ctrl_c_token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Ctrl-C received, finishing current file before stopping");
                    ctrl_c_token.cancel();
                }
            });

            let orchestrator = IngestOrchestrator::new(config, pool);
            let report = orchestrator.run(cancel).await?;
            println!("{}", report.summary());
        }
        Command::Status => {
            let pool = config.connect().await?;
            let storage = ContractStorage::new(pool);
            let contracts = storage.contract_count().await?;
            let files = storage.processed_file_count().await?;
            println!("Contracts stored: {contracts}");
            println!("Files processed: {files}");
        }
    }

    info!("Done");
    Ok(())
}
