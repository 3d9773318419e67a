//! Runtime configuration resolved from environment variables.
//!
//! # Invariants
//! - Blank variables behave as unset and fall back to defaults.
//! - Resolution never fails; validation of the values happens where they
//!   are consumed (`open_db`, `init_logging`).

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "MVCMOVIE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "MVCMOVIE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MVCMOVIE_LOG_DIR";
pub const ENV_SEED: &str = "MVCMOVIE_SEED";

const DEFAULT_DB_FILE_NAME: &str = "mvcmovie.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "mvcmovie-logs";

/// Application settings shared by the CLI and embedding hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    /// Run the sample seeder at startup.
    pub seed_on_startup: bool,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, which returns the raw value
    /// for a variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };

        Self {
            db_path: value(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: value(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: value(ENV_LOG_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)),
            seed_on_startup: value(ENV_SEED).map_or(true, |raw| !is_disabled(&raw)),
        }
    }
}

fn is_disabled(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ENV_DB_PATH, ENV_LOG_LEVEL, ENV_SEED};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]);
        assert!(config.db_path.ends_with("mvcmovie.sqlite3"));
        assert!(config.log_dir.ends_with("mvcmovie-logs"));
        assert!(config.seed_on_startup);
        assert!(!config.log_level.is_empty());
    }

    #[test]
    fn explicit_values_override_defaults_and_blank_values_do_not() {
        let config = config_from(&[
            (ENV_DB_PATH, " /data/movies.db "),
            (ENV_LOG_LEVEL, "   "),
            (ENV_SEED, "Off"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/data/movies.db"));
        assert_eq!(config.log_level, crate::logging::default_log_level());
        assert!(!config.seed_on_startup);
    }
}
