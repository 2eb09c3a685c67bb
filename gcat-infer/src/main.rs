//! gcat-infer - Genre inference batch job
//!
//! Recomputes every singer's inferred genre from the playlists that contain
//! the singer's songs. Meant to be triggered on demand or by a scheduler;
//! the run history table keeps two scheduled runs from overlapping.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gcat_common::config::{database_path, load_toml_config, resolve_root_folder, CompiledDefaults};
use gcat_infer::db::runs;
use gcat_infer::{
    run_batch, InferenceError, InferenceOrchestrator, InferenceReport, InferenceSettings,
    SqliteCatalogStore,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gcat-infer", version, about = "Infer singer genres from playlist membership")]
struct Cli {
    /// Folder containing genre_catalog.db (overrides GCAT_ROOT_FOLDER and config file)
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: <config dir>/gcat/config.toml)
    #[arg(long, global = true, env = "GCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum time to retry a locked write, in milliseconds
    #[arg(long, global = true)]
    max_lock_wait_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recompute and store the inferred genre of every singer
    Run {
        /// Start even if an earlier run is still recorded as RUNNING
        #[arg(long)]
        force: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show playlists, tally and selected genre for one singer (read-only)
    Explain {
        singer_id: i64,
        #[arg(long)]
        json: bool,
    },
    /// List recent inference runs
    History {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Config is read before tracing so that its log_level can seed the filter
    let (toml, config_error) = match load_toml_config(cli.config.as_deref()) {
        Ok(toml) => (toml, None),
        Err(e) => (None, Some(e)),
    };

    let default_level = toml
        .as_ref()
        .and_then(|c| c.log_level.clone())
        .unwrap_or_else(|| CompiledDefaults::for_current_platform().log_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_level)),
        )
        .init();

    info!(
        "Starting gcat-infer v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let Some(e) = config_error {
        warn!("Ignoring config file, using defaults: {}", e);
    }

    let root_folder = resolve_root_folder(cli.root_folder.as_deref(), toml.as_ref());
    let db_path = database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let pool = gcat_infer::db::init_database_pool(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let mut settings = InferenceSettings::from_toml(toml.as_ref());
    if let Some(wait) = cli.max_lock_wait_ms {
        settings.max_lock_wait_ms = wait;
    }

    let max_lock_wait_ms = settings.max_lock_wait_ms;
    let store = Arc::new(SqliteCatalogStore::new(pool.clone(), settings));
    let orchestrator = InferenceOrchestrator::new(store);

    match cli.command {
        Command::Run { force, json } => {
            let run = match run_batch(&pool, &orchestrator, force, max_lock_wait_ms).await {
                Ok(run) => run,
                Err(InferenceError::AlreadyRunning) => anyhow::bail!(
                    "Another inference run is recorded as RUNNING; \
                     rerun with --force if that run is known to be dead"
                ),
                Err(e) => return Err(e.into()),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&run.report)?);
            } else {
                print_report(run.run_id, &run.report);
            }

            Ok(ExitCode::from(run.exit_code()))
        }
        Command::Explain { singer_id, json } => {
            let inference = orchestrator.infer_singer(singer_id).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&inference)?);
            } else {
                println!("Singer {}", inference.singer_id);
                println!("Playlists:");
                for playlist in &inference.playlists {
                    let genre = playlist
                        .genre_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("  {:>6}  genre {:>6}  {}", playlist.id, genre, playlist.name);
                }
                println!("Tally (count desc, genre id asc):");
                for (genre_id, count) in &inference.ranked {
                    println!("  genre {:>6}: {}", genre_id, count);
                }
                match inference.selected {
                    Some(genre_id) => println!("Selected genre: {}", genre_id),
                    None => println!("Selected genre: none (no genre-tagged playlists)"),
                }
            }

            Ok(ExitCode::SUCCESS)
        }
        Command::History { limit } => {
            for run in runs::list_recent_runs(&pool, limit).await? {
                let finished = run
                    .finished_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "#{:<5} {:<10} started {}  finished {}  examined {}  updated {}  skipped {}",
                    run.id,
                    run.state,
                    run.started_at.to_rfc3339(),
                    finished,
                    run.singers_examined,
                    run.updated,
                    run.skipped.len()
                );
                if let Some(e) = run.error {
                    println!("       error: {}", e);
                }
            }

            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_report(run_id: i64, report: &InferenceReport) {
    println!(
        "Run #{}: examined {} singer(s), updated {}, skipped {} ({} ms)",
        run_id,
        report.singers_examined,
        report.updated,
        report.skipped.len(),
        report.duration_ms()
    );
    for skipped in &report.skipped {
        println!("  singer {:>6}: {}", skipped.singer_id, skipped.reason);
    }
}
