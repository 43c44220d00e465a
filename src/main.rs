use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use pgpatch::commands::{self, DiffFormat};
use pgpatch::config::{self, PatchArgs};
use pgpatch::constants::CONFIG_FILENAME;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config_file: String,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the configured objects with the database
    Diff {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: DiffFormat,

        #[command(flatten)]
        patch_args: PatchArgs,
    },

    /// Write the update script and its rollback script
    Write {
        /// Update script path; the rollback goes to <stem>.drop.<ext>
        file: PathBuf,

        /// Write plain statements without the transactional block
        #[arg(long)]
        no_transaction: bool,

        #[command(flatten)]
        patch_args: PatchArgs,
    },

    /// Apply the patch to the database
    Apply {
        /// Also write the rollback script to this path
        #[arg(long)]
        rollback_file: Option<PathBuf>,

        #[command(flatten)]
        patch_args: PatchArgs,
    },
}

impl Commands {
    fn patch_args(&self) -> &PatchArgs {
        match self {
            Commands::Diff { patch_args, .. }
            | Commands::Write { patch_args, .. }
            | Commands::Apply { patch_args, .. } => patch_args,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logging(&cli);
    tokio::select! {
        result = run_main(cli) => result,
        _ = wait_for_shutdown_signal() => {
            info!("Received shutdown signal, abandoning patch session");
            Ok(())
        }
    }
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

async fn run_main(cli: Cli) -> Result<()> {
    let file_config = config::load_config(&cli.config_file)?;
    let config = config::ConfigBuilder::new()
        .with_file(file_config)
        .with_cli_args(cli.command.patch_args().clone().into())
        .resolve();

    match &cli.command {
        Commands::Diff { format, .. } => commands::cmd_diff(&config, *format).await,
        Commands::Write {
            file,
            no_transaction,
            ..
        } => commands::cmd_write(&config, file, *no_transaction).await,
        Commands::Apply { rollback_file, .. } => {
            commands::cmd_apply(&config, rollback_file.as_deref()).await
        }
    }
}
