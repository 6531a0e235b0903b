use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use playhistory_pipeline::config::{AppConfig, CliConfig, FileConfig};
use playhistory_pipeline::pipeline;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the per-session event CSV fragments.
    #[clap(value_parser = parse_path)]
    pub event_data_dir: PathBuf,

    /// Path to the SQLite database file for the projection tables.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Write the consolidated canonical CSV to this path.
    #[clap(long, value_parser = parse_path)]
    pub consolidated_out: Option<PathBuf>,

    /// Keep the projection tables instead of dropping them at the end.
    #[clap(long)]
    pub keep_tables: bool,

    /// Path to a TOML config file; its values override the CLI.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!(
        "playhistory-pipeline {}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        event_data_dir: Some(cli_args.event_data_dir),
        db_path: cli_args.db_path,
        consolidated_out: cli_args.consolidated_out,
        keep_tables: cli_args.keep_tables,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening projection store at {:?}...", config.db_path);
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("Could not open store at {:?}", config.db_path))?;

    let report = pipeline::run(&config, &conn)?;

    info!(
        "Session {} item {}: {}",
        config.queries.session_id,
        config.queries.item_in_session,
        match &report.answers.session_play {
            Some(play) => format!("{} - {} ({:.4}s)", play.artist, play.song, play.length),
            None => "no match".to_string(),
        }
    );
    info!(
        "User {} session {}: {} play(s)",
        config.queries.user_id,
        config.queries.user_session_id,
        report.answers.songplays.len()
    );
    for play in &report.answers.songplays {
        info!(
            "  {} - {} ({} {})",
            play.artist, play.song, play.first_name, play.last_name
        );
    }
    info!(
        "Listeners of {:?}: {}",
        config.queries.song,
        report.answers.listeners.len()
    );
    for listener in &report.answers.listeners {
        info!("  {} {}", listener.first_name, listener.last_name);
    }

    if config.keep_tables {
        info!("Keeping projection tables ({:?})", config.db_path);
    } else {
        pipeline::teardown(&conn);
    }

    if let Err((_, err)) = conn.close() {
        warn!("Could not close store cleanly: {err}");
    }

    Ok(())
}
