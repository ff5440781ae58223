use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = ".pop-planner";
pub const DEFAULT_STORAGE_KEY: &str = "meus-projetos";
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_PRINT_DELAY_MS: u64 = 500;
pub const MAX_PRINT_DELAY_MS: u64 = 60_000;

/// Top-level configuration for the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub report: ReportConfig,
    pub telemetry: TelemetryConfig,
}

/// Where the project collection lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Delay between the print view loading and the print dialog.
    pub print_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl AppConfig {
    /// Reads `.env` (when present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("POP_PLANNER_DATA_DIR")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        let key = match lookup("POP_PLANNER_STORAGE_KEY") {
            Some(value) => parse_storage_key(&value)?,
            None => DEFAULT_STORAGE_KEY.to_string(),
        };

        let print_delay_ms = match lookup("POP_PLANNER_PRINT_DELAY_MS") {
            Some(value) => parse_print_delay(&value)?,
            None => DEFAULT_PRINT_DELAY_MS,
        };

        let log_level = lookup("POP_PLANNER_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            storage: StorageConfig { data_dir, key },
            report: ReportConfig { print_delay_ms },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn parse_storage_key(value: &str) -> Result<String, ConfigError> {
    let key = value.trim();
    if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
        return Err(ConfigError::InvalidStorageKey {
            value: value.to_string(),
        });
    }
    Ok(key.to_string())
}

fn parse_print_delay(value: &str) -> Result<u64, ConfigError> {
    let delay = value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidPrintDelay {
            value: value.to_string(),
        })?;
    if delay > MAX_PRINT_DELAY_MS {
        return Err(ConfigError::PrintDelayTooLong {
            value: delay,
            max: MAX_PRINT_DELAY_MS,
        });
    }
    Ok(delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(|_| None).expect("defaults load");
        assert_eq!(config.storage.data_dir, PathBuf::from(".pop-planner"));
        assert_eq!(config.storage.key, "meus-projetos");
        assert_eq!(config.report.print_delay_ms, 500);
        assert_eq!(config.telemetry.log_level, "warn");
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("POP_PLANNER_DATA_DIR", "/var/lib/pops"),
            ("POP_PLANNER_STORAGE_KEY", " clinica "),
            ("POP_PLANNER_PRINT_DELAY_MS", "0"),
            ("POP_PLANNER_LOG", "pop_planner=debug"),
        ]))
        .expect("config loads");
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/pops"));
        assert_eq!(config.storage.key, "clinica");
        assert_eq!(config.report.print_delay_ms, 0);
        assert_eq!(config.telemetry.log_level, "pop_planner=debug");
    }

    #[test]
    fn rejects_bad_print_delay() {
        let err = AppConfig::from_lookup(lookup_from(&[("POP_PLANNER_PRINT_DELAY_MS", "soon")]))
            .expect_err("non-numeric delay");
        assert!(matches!(err, ConfigError::InvalidPrintDelay { .. }));

        let err = AppConfig::from_lookup(lookup_from(&[("POP_PLANNER_PRINT_DELAY_MS", "60001")]))
            .expect_err("delay over the ceiling");
        assert!(matches!(err, ConfigError::PrintDelayTooLong { value: 60_001, .. }));
    }

    #[test]
    fn rejects_storage_key_with_separators() {
        let err = AppConfig::from_lookup(lookup_from(&[("POP_PLANNER_STORAGE_KEY", "../etc")]))
            .expect_err("path-like key");
        assert!(matches!(err, ConfigError::InvalidStorageKey { .. }));
    }

    #[test]
    fn load_reads_process_environment() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        env::set_var("POP_PLANNER_STORAGE_KEY", "from-env");
        let config = AppConfig::load().expect("config loads");
        env::remove_var("POP_PLANNER_STORAGE_KEY");
        assert_eq!(config.storage.key, "from-env");
    }
}
