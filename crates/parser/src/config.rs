//! Engine configuration.
//!
//! All knobs are explicit and travel with the engine instance; nothing is
//! read from process-wide state at parse time. Loading follows the usual
//! precedence: environment variables > config file > defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run the enrichment pass after parsing. Also requires a provider.
    pub enrich_game_data: bool,
    /// Backing file for the lookup cache; `None` disables persistence.
    pub cache_path: Option<PathBuf>,
    /// Cache entry lifetime in seconds; `None` keeps entries forever.
    pub cache_ttl_secs: Option<u64>,
    /// Extension used for directory-mode discovery.
    pub log_extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enrich_game_data: false,
            cache_path: None,
            cache_ttl_secs: None,
            log_extension: "log".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `RAIDLOG_CONFIG_FILE` (TOML) when present,
    /// then apply environment overrides.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = match std::env::var("RAIDLOG_CONFIG_FILE") {
            Ok(path) if Path::new(&path).exists() => {
                tracing::info!(path, "loading engine configuration");
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };

        if let Ok(enrich) = std::env::var("RAIDLOG_ENRICH") {
            config.enrich_game_data = enrich.parse().unwrap_or(config.enrich_game_data);
        }
        if let Ok(path) = std::env::var("RAIDLOG_CACHE_PATH") {
            config.cache_path = Some(PathBuf::from(path));
        }
        if let Ok(ttl) = std::env::var("RAIDLOG_CACHE_TTL_SECS") {
            config.cache_ttl_secs = ttl.parse().ok();
        }
        if let Ok(ext) = std::env::var("RAIDLOG_LOG_EXTENSION") {
            config.log_extension = ext;
        }

        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}
