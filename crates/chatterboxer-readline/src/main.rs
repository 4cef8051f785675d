use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use chatterboxer_application::ChatSession;
use chatterboxer_core::{ConversationRepository, config::AppConfig};
use chatterboxer_infrastructure::{ConfigStorage, ParquetConversationStore, SavePaths};

mod commands;
mod repl;

#[derive(Parser)]
#[command(name = "chatterboxer")]
#[command(about = "ChatterBoxer - author synthetic chat transcripts and save them as Parquet", long_about = None)]
struct Cli {
    /// Config file (defaults to ./chatterboxer.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root save directory, overriding the config file
    #[arg(long, global = true)]
    save_dir: Option<PathBuf>,

    /// Keep directory-listing order when aggregating instead of sorting by ID
    #[arg(long, global = true)]
    no_sort: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every saved conversation into the aggregate file and exit
    Aggregate,
    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = ConfigStorage::resolve(cli.config.as_deref());

    if let Some(Commands::InitConfig { force }) = cli.command {
        return init_config(&storage, force);
    }

    let mut config = storage
        .load_or_default()
        .with_context(|| format!("Failed to load config from {}", storage.path().display()))?;
    apply_overrides(&mut config, &cli);

    let _guard = init_tracing(&log_dir(&config))?;
    tracing::info!(
        "[Bootstrap] Config {}, save directory {}",
        storage.path().display(),
        config.storage.save_dir.display()
    );

    let store = ParquetConversationStore::open(&config.storage).with_context(|| {
        format!(
            "Failed to prepare save directory {}",
            config.storage.save_dir.display()
        )
    })?;

    match cli.command {
        Some(Commands::Aggregate) => {
            let report = store.aggregate()?;
            println!(
                "{}",
                format!(
                    "Wrote {} conversations to {}",
                    report.conversations,
                    report.destination.display()
                )
                .green()
            );
            Ok(())
        }
        Some(Commands::InitConfig { .. }) => Ok(()),
        None => repl::run(ChatSession::open(store)?),
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(save_dir) = &cli.save_dir {
        config.storage.save_dir = save_dir.clone();
    }
    if cli.no_sort {
        config.storage.sort_by_id = false;
    }
}

fn init_config(storage: &ConfigStorage, force: bool) -> Result<()> {
    if storage.path().exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            storage.path().display()
        );
    }
    storage.save(&AppConfig::default())?;
    println!("{}", format!("Wrote {}", storage.path().display()).green());
    Ok(())
}

/// The log directory for `config`, known before the save tree exists.
fn log_dir(config: &AppConfig) -> PathBuf {
    SavePaths::from_config(&config.storage).log_dir()
}

/// Logs to `<save_dir>/logs/chatterboxer.log.YYYY-MM-DD` so REPL output stays clean.
///
/// The returned guard flushes buffered lines on drop and must be held for the
/// life of the process.
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, "chatterboxer.log"));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    Ok(guard)
}
