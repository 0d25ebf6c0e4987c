//! Wallet migration CLI
//!
//! - `scan`: list wallets and the encoding each is stored in
//! - `verify`: dry-run the conversion of every legacy wallet
//! - `migrate`: dry-run, back up and convert every legacy wallet
//!
//! Exits with status 2 when any wallet needs attention after a batch.

mod commands;
mod progress;
mod registry;

use clap::{Args, Parser, Subcommand};
use commands::BatchMode;
use std::path::PathBuf;
use std::process::ExitCode;
use wallet_migration::{DryRunVerifier, MigrationReport};
use wallet_store_file::config::DEFAULT_WALLET_EXTENSION;
use wallet_store_file::{FileStoreConfig, FileWalletStore};

/// Exit status when a batch left wallets needing attention
const EXIT_NEEDS_ATTENTION: u8 = 2;

#[derive(Parser)]
#[command(name = "wallet-migrate")]
#[command(about = "Migrate wallet files from the legacy to the structured encoding", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Wallet file extension to look for in directories
    #[arg(long, global = true, default_value = DEFAULT_WALLET_EXTENSION)]
    ext: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List wallets and mark the ones still in the legacy encoding
    Scan {
        /// Wallet files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Dry-run the migration without touching any wallet
    Verify {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Migrate every legacy wallet to the structured encoding
    Migrate {
        #[command(flatten)]
        batch: BatchArgs,

        /// Directory for pre-migration backups (defaults to beside each wallet)
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Skip the SHA-256 comparison of each backup against its original
        #[arg(long)]
        no_verify_backups: bool,
    },
}

#[derive(Args)]
struct BatchArgs {
    /// Wallet files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Directory for dry-run copies (defaults to the system temp dir)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Write the batch report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

impl BatchArgs {
    fn verifier(&self) -> DryRunVerifier {
        match &self.scratch_dir {
            Some(dir) => DryRunVerifier::with_scratch_dir(dir),
            None => DryRunVerifier::new(),
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(report: &MigrationReport) -> ExitCode {
    if report.needs_attention() {
        ExitCode::from(EXIT_NEEDS_ATTENTION)
    } else {
        ExitCode::SUCCESS
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = FileStoreConfig::default().with_wallet_extension(cli.ext);

    let (report, report_path) = match cli.command {
        Commands::Scan { paths } => {
            commands::scan(&FileWalletStore::new(config), &paths)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Verify { batch } => {
            let report = commands::run_batch(
                FileWalletStore::new(config),
                &batch.paths,
                batch.verifier(),
                BatchMode::VerifyOnly,
            )
            .await?;
            (report, batch.report)
        }
        Commands::Migrate {
            batch,
            backup_dir,
            no_verify_backups,
        } => {
            let mut config = config;
            config.backup_dir = backup_dir;
            config.verify_backups = !no_verify_backups;
            let report = commands::run_batch(
                FileWalletStore::new(config),
                &batch.paths,
                batch.verifier(),
                BatchMode::Migrate,
            )
            .await?;
            (report, batch.report)
        }
    };

    if let Some(path) = report_path {
        commands::write_report(&report, &path)?;
    }
    Ok(exit_code(&report))
}
