use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "dcr")]
#[command(about = "Discount code reconciliation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a code list against the platform and write a results ledger
    Run {
        /// JSON file: {"codes": [...]} or a bare array
        #[arg(long)]
        codes: PathBuf,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Create discounts for codes that have none (default: skip)
        #[arg(long, default_value_t = false)]
        create_missing: bool,

        /// Codes per batch (overrides engine.batch_size)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        batch_size: Option<u64>,

        /// Flush every N batches (overrides engine.save_frequency)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        save_frequency: Option<u64>,

        /// Continue an existing ledger instead of creating a new one
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Fail instead of warning when the config has keys nothing reads
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// Print statistics for a results ledger
    Summary {
        #[arg(long)]
        ledger: PathBuf,

        /// Number of codes originally provided (default: ledger size)
        #[arg(long)]
        total: Option<usize>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience); production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run {
            codes,
            config_paths,
            create_missing,
            batch_size,
            save_frequency,
            resume,
            strict_config,
        } => {
            commands::run::run_reconcile(commands::run::RunArgs {
                codes,
                config_paths,
                create_missing,
                batch_size,
                save_frequency,
                resume,
                strict_config,
            })
            .await?;
        }

        Commands::Summary { ledger, total } => {
            commands::summary::print_summary(&ledger, total)?;
        }

        Commands::ConfigHash { paths } => {
            let loaded = commands::load_config(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
