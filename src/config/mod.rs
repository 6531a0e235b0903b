mod file_config;

pub use file_config::{FileConfig, QueriesConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub event_data_dir: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub consolidated_out: Option<PathBuf>,
    pub keep_tables: bool,
}

/// Parameters of the three fixed acceptance queries run after the load.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// Session lookup: which session.
    pub session_id: i64,
    /// Session lookup: which item within the session.
    pub item_in_session: i64,
    /// Songplay lookup: which user.
    pub user_id: i64,
    /// Songplay lookup: which of the user's sessions.
    pub user_session_id: i64,
    /// Listener lookup: which song.
    pub song: String,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            session_id: 338,
            item_in_session: 4,
            user_id: 10,
            user_session_id: 182,
            song: "All Hands Against His Own".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the per-session event CSV fragments.
    pub event_data_dir: PathBuf,
    /// SQLite database file for the projection tables.
    pub db_path: PathBuf,
    /// Where to write the consolidated canonical CSV, if anywhere.
    pub consolidated_out: Option<PathBuf>,
    /// Skip the drop-tables teardown so the store stays inspectable.
    pub keep_tables: bool,
    pub queries: QueryParams,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let event_data_dir = file
            .event_data_dir
            .map(PathBuf::from)
            .or_else(|| cli.event_data_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("event_data_dir must be specified via CLI or in config file")
            })?;

        if !event_data_dir.exists() {
            bail!("Event data directory does not exist: {:?}", event_data_dir);
        }
        if !event_data_dir.is_dir() {
            bail!("event_data_dir is not a directory: {:?}", event_data_dir);
        }

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from("playhistory.db"));

        let consolidated_out = file
            .consolidated_out
            .map(PathBuf::from)
            .or_else(|| cli.consolidated_out.clone());

        let keep_tables = file.keep_tables.unwrap_or(cli.keep_tables);

        let file_queries = file.queries.unwrap_or_default();
        let defaults = QueryParams::default();
        let queries = QueryParams {
            session_id: file_queries.session_id.unwrap_or(defaults.session_id),
            item_in_session: file_queries
                .item_in_session
                .unwrap_or(defaults.item_in_session),
            user_id: file_queries.user_id.unwrap_or(defaults.user_id),
            user_session_id: file_queries
                .user_session_id
                .unwrap_or(defaults.user_session_id),
            song: file_queries.song.unwrap_or(defaults.song),
        };

        Ok(Self {
            event_data_dir,
            db_path,
            consolidated_out,
            keep_tables,
            queries,
        })
    }
}
