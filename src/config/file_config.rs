use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub event_data_dir: Option<String>,
    pub db_path: Option<String>,
    pub consolidated_out: Option<String>,
    pub keep_tables: Option<bool>,

    // Acceptance query parameters
    pub queries: Option<QueriesConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct QueriesConfig {
    pub session_id: Option<i64>,
    pub item_in_session: Option<i64>,
    pub user_id: Option<i64>,
    pub user_session_id: Option<i64>,
    pub song: Option<String>,
}

impl FileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {:?}", path))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Could not parse config file: {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            event_data_dir = "/data/event_data"
            db_path = "history.db"
            keep_tables = true

            [queries]
            session_id = 23
            song = "Reverence"
            "#,
        )
        .unwrap();

        assert_eq!(config.event_data_dir.as_deref(), Some("/data/event_data"));
        assert_eq!(config.db_path.as_deref(), Some("history.db"));
        assert_eq!(config.keep_tables, Some(true));
        let queries = config.queries.unwrap();
        assert_eq!(queries.session_id, Some(23));
        assert_eq!(queries.item_in_session, None);
        assert_eq!(queries.song.as_deref(), Some("Reverence"));
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.event_data_dir.is_none());
        assert!(config.queries.is_none());
    }
}
