//! # Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DUKA_DB_PATH=/var/lib/duka/duka.db                                 │
//! │     DUKA_MAX_CONNECTIONS=8                                             │
//! │     DUKA_SALE_PREFIX=SALE                                              │
//! │     DUKA_NUMBER_ATTEMPTS=5                                             │
//! │     DUKA_ALERTS_AFTER_SALE=true                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/duka-pos/engine.toml (Linux)                             │
//! │     ~/Library/Application Support/com.duka.pos/engine.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [database]
//! path = "duka.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [numbering]
//! sale_prefix = "SALE"
//! order_prefix = "ORD"
//! payment_prefix = "PAY"
//! max_attempts = 5
//!
//! [alerts]
//! after_sale = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use duka_db::DbConfig;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file; `:memory:` for a throwaway database.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for SQLite's write lock.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("duka.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Business number generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingSettings {
    #[serde(default = "default_sale_prefix")]
    pub sale_prefix: String,

    #[serde(default = "default_order_prefix")]
    pub order_prefix: String,

    #[serde(default = "default_payment_prefix")]
    pub payment_prefix: String,

    /// Candidates tried before a collision is reported as `Conflict`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_sale_prefix() -> String {
    "SALE".to_string()
}

fn default_order_prefix() -> String {
    "ORD".to_string()
}

fn default_payment_prefix() -> String {
    "PAY".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

impl Default for NumberingSettings {
    fn default() -> Self {
        NumberingSettings {
            sale_prefix: default_sale_prefix(),
            order_prefix: default_order_prefix(),
            payment_prefix: default_payment_prefix(),
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Run the alert generator for products a committed sale left low.
    #[serde(default = "default_true")]
    pub after_sale: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AlertSettings {
    fn default() -> Self {
        AlertSettings { after_sale: true }
    }
}

// =============================================================================
// Engine Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub numbering: NumberingSettings,

    #[serde(default)]
    pub alerts: AlertSettings,
}

impl EngineConfig {
    /// Loads from `config_path` (or the platform default), then applies
    /// environment overrides and validates.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document without touching the environment.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        for (name, prefix) in [
            ("sale_prefix", &self.numbering.sale_prefix),
            ("order_prefix", &self.numbering.order_prefix),
            ("payment_prefix", &self.numbering.payment_prefix),
        ] {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(ConfigError::Invalid(format!(
                    "numbering.{name} must be non-empty uppercase ASCII, got: {prefix:?}"
                )));
            }
        }

        if self.numbering.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "numbering.max_attempts must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("DUKA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("DUKA_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid DUKA_MAX_CONNECTIONS"),
            }
        }

        if let Ok(prefix) = std::env::var("DUKA_SALE_PREFIX") {
            self.numbering.sale_prefix = prefix;
        }

        if let Ok(attempts) = std::env::var("DUKA_NUMBER_ATTEMPTS") {
            match attempts.parse::<u32>() {
                Ok(n) => self.numbering.max_attempts = n,
                Err(_) => warn!(value = %attempts, "Ignoring invalid DUKA_NUMBER_ATTEMPTS"),
            }
        }

        if let Ok(flag) = std::env::var("DUKA_ALERTS_AFTER_SALE") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.alerts.after_sale = true,
                "0" | "false" | "no" => self.alerts.after_sale = false,
                _ => warn!(value = %flag, "Unknown DUKA_ALERTS_AFTER_SALE value"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "duka", "pos")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }

    /// Pool settings for [`duka_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        if self.database.path == std::path::Path::new(":memory:") {
            return DbConfig::in_memory();
        }

        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.numbering.sale_prefix, "SALE");
        assert_eq!(config.numbering.max_attempts, 5);
        assert!(config.alerts.after_sale);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [numbering]
            max_attempts = 3

            [alerts]
            after_sale = false
            "#,
        )
        .unwrap();

        assert_eq!(config.numbering.max_attempts, 3);
        assert_eq!(config.numbering.order_prefix, "ORD");
        assert!(!config.alerts.after_sale);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.numbering.max_attempts = 0;
        assert!(config.validate().is_err());

        config.numbering.max_attempts = 5;
        config.numbering.sale_prefix = "sale-".to_string();
        assert!(config.validate().is_err());

        config.numbering.sale_prefix = "MAUZO".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip_and_memory_path() {
        let mut config = EngineConfig::default();
        config.database.path = PathBuf::from(":memory:");

        let parsed = EngineConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
        assert!(parsed.db_config().is_in_memory());
    }
}
