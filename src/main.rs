use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use autosolo::chapter::{Outcome, load_chapters};
use autosolo::config::{Config, default_local_data_dir};
use autosolo::store::{ProgressStore, detect_identity};

#[derive(Parser)]
#[command(name = "autosolo")]
#[command(version, about = "Solo-chapter progress tooling for the auto-solo runner")]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the session database and chapter list
    /// (defaults to the platform data dir).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the chapter list, printing a per-gate breakdown
    Chapters {
        /// Chapter list file (defaults to solo_chapters.json in the data dir)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show per-identity ledger counts from the progress store
    Stats {
        /// Ledger identity (defaults to the auto-detected one)
        #[arg(long)]
        identity: Option<String>,
    },
    /// Print the identity that progress would be recorded under
    Identity {
        /// Folder scanned for per-user entries (defaults to the game's
        /// local-data folder)
        #[arg(long)]
        local_data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::default();
    if let Some(dir) = cli.data_dir {
        config.chapters_file = dir.join("solo_chapters.json");
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Chapters { file } => {
            cmd_chapters(&file.unwrap_or_else(|| config.chapters_file.clone()))
        }
        Commands::Stats { identity } => cmd_stats(&config, identity),
        Commands::Identity { local_data_dir } => {
            let dir = local_data_dir.unwrap_or_else(default_local_data_dir);
            println!("{}", detect_identity(&dir));
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn cmd_chapters(path: &PathBuf) -> Result<()> {
    let chapters = load_chapters(path)?;
    println!("{} chapters in {}", chapters.len(), path.display());

    let mut gates: BTreeMap<u32, usize> = BTreeMap::new();
    for chapter in &chapters {
        *gates.entry(chapter.gate().get()).or_default() += 1;
    }
    for (gate, count) in gates {
        println!("  gate {gate:>3}: {count} chapters");
    }
    Ok(())
}

fn cmd_stats(config: &Config, identity: Option<String>) -> Result<()> {
    let identity = identity.unwrap_or_else(|| config.resolve_identity());
    let mut store = ProgressStore::open(&config.db_path(), identity.clone())?;
    let stats = store.stats()?;
    let resolved = store.completed()?.len();
    store.close();

    println!("identity: {identity}");
    for outcome in [Outcome::Won, Outcome::Skipped, Outcome::Failed] {
        println!(
            "  {:>8}: {}",
            outcome.as_str(),
            stats.get(&outcome).copied().unwrap_or(0)
        );
    }
    println!("  resolved: {resolved}");
    Ok(())
}
