//! SharedWallet CLI - drive a shared wallet from scripts
//!
//! The wallet lives in memory for the duration of one command. Scripts play
//! the role of the transaction layer: they say who is calling, with what
//! amount, and what the wallet should look like afterwards.
//!
//! # Quick Start
//!
//! ```bash
//! # Run the built-in scenarios
//! sharedwallet demo
//!
//! # Run your own session
//! sharedwallet run session.json
//!
//! # Make up some accounts
//! sharedwallet identity -n 3
//! ```
//!
//! `SHAREDWALLET_OWNER` and `SHAREDWALLET_NAME` (from the environment or a
//! `.env` file) configure the wallet when a script does not name an owner.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod display;
mod script;

use commands::{demo, identity, run};

/// SharedWallet CLI - an owner-controlled pool with spending allowances
#[derive(Parser)]
#[command(name = "sharedwallet")]
#[command(version)]
#[command(about = "Run scripted sessions against an in-memory shared wallet", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a JSON script against a fresh wallet
    Run {
        /// Path to the script
        script: PathBuf,

        /// Print the final snapshot as JSON instead of the step report
        #[arg(long)]
        json: bool,
    },

    /// Run the reference deposit/withdraw/allowance scenarios
    Demo,

    /// Generate random identities
    Identity {
        /// How many to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .init();

    match cli.command {
        Commands::Run { script, json } => run::run_script(&script, json).await?,
        Commands::Demo => demo::run_demo().await?,
        Commands::Identity { count } => identity::generate(count),
    }

    Ok(())
}
