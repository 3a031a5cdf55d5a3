//! Runtime configuration read from the environment (and `.env`, loaded in `main`).
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "db.sqlite3";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    /// Insert the sample story when the library is empty.
    pub seed_sample_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: "info".to_string(),
            seed_sample_data: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_path = lookup("MNEMONIC_DB_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let log_level = lookup("RUST_LOG").unwrap_or(defaults.log_level);

        let seed_sample_data = lookup("MNEMONIC_SEED_SAMPLE")
            .and_then(|value| parse_bool(&value))
            .unwrap_or(defaults.seed_sample_data);

        Self {
            database_path,
            log_level,
            seed_sample_data,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
