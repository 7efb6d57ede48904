#![forbid(unsafe_code)]
//! Ledger node: serves the HTTP API, or inspects and validates a stored chain.

use clap::{Parser, Subcommand};
use colored::*;
use precursor_ledger::api::run_api_server;
use precursor_ledger::blockchain::Blockchain;
use precursor_ledger::config::{load_config_from, Config, DEFAULT_CONFIG_PATH};
use precursor_ledger::node::Node;
use precursor_ledger::persistence::JsonFilePersistence;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Chain file to use instead of `ledger.data_file`
    #[arg(long)]
    data_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load (or create) the chain and serve the HTTP API
    Serve,
    /// Print a summary of the stored chain
    Inspect,
    /// Validate the stored chain and report the first failure
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config_from(&cli.config)?;
    let data_file = cli
        .data_file
        .unwrap_or_else(|| PathBuf::from(&config.ledger.data_file));
    let storage = JsonFilePersistence::new(data_file);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config, storage).await?,
        Commands::Inspect => inspect(&config, &storage)?,
        Commands::Validate => {
            if !validate(&config, &storage)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn serve(config: &Config, storage: JsonFilePersistence) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.api_addr()?;
    tracing::info!(
        data_file = %storage.path().display(),
        difficulty = config.ledger.difficulty,
        pow_target = ?config.ledger.pow_target,
        "Starting ledger node"
    );

    let node = Node::bootstrap(config.proof_of_work(), Arc::new(storage))?;
    run_api_server(Arc::new(node), addr).await?;
    Ok(())
}

fn load_stored(config: &Config, storage: &JsonFilePersistence) -> Result<Blockchain, Box<dyn std::error::Error>> {
    let mut chain = Blockchain::new(config.proof_of_work())?;
    chain.load(storage)?;
    Ok(chain)
}

fn inspect(config: &Config, storage: &JsonFilePersistence) -> Result<(), Box<dyn std::error::Error>> {
    let chain = load_stored(config, storage)?;

    println!("{} {}", "Chain file:".bright_cyan(), storage.path().display());
    println!("{} {}", "Blocks:".bright_cyan(), chain.len());
    println!(
        "{} {} ({:?})\n",
        "Difficulty:".bright_cyan(),
        chain.difficulty(),
        chain.pow_target()
    );

    for block in chain.blocks() {
        let marker = if block.is_intact() {
            "ok".green()
        } else {
            "TAMPERED".red().bold()
        };
        println!(
            "#{:<5} {}  nonce {:<10} txs {:<4} {}",
            block.index(),
            block.hash().bright_yellow(),
            block.nonce(),
            block.transactions().len(),
            marker
        );
        println!("       {} {}", "prev".dimmed(), block.previous_hash().dimmed());
        for tx in block.transactions() {
            println!(
                "       {} {} {} {} {} -> {}",
                tx.event_type().as_str().bright_magenta(),
                tx.quantity(),
                tx.unit(),
                tx.chemical_urn(),
                tx.sender_urn(),
                tx.recipient_urn()
            );
        }
    }

    Ok(())
}

fn validate(config: &Config, storage: &JsonFilePersistence) -> Result<bool, Box<dyn std::error::Error>> {
    let chain = load_stored(config, storage)?;

    match chain.validate() {
        Ok(()) => {
            println!("{} ({} blocks)", "The blockchain is valid.".green().bold(), chain.len());
            Ok(true)
        }
        Err(failure) => {
            println!("{} {}", "The blockchain is NOT valid:".red().bold(), failure);
            Ok(false)
        }
    }
}
