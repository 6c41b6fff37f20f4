//! Bootstrap configuration
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments
//! 2. Environment variables (`HEARING_*`)
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! Binaries apply layers 1 and 2 through clap on top of the [`HearingConfig`]
//! returned by [`HearingConfig::load`], which covers layers 3 and 4.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Error, Result};

pub const DEFAULT_MODEL_PATH: &str = "hearing_model.json";
pub const DEFAULT_DATASET_PATH: &str = "realistic_synthetic_audiogram_data.csv";

/// Top-level TOML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HearingConfig {
    /// Model artifact written by the trainer and read by the API
    pub model_path: PathBuf,
    /// Labelled training dataset
    pub dataset_path: PathBuf,
    pub api: ApiConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

impl Default for HearingConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            api: ApiConfig::default(),
            training: TrainingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// How prediction failures are reported over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorContract {
    /// Always 200; failure is signalled only by an `error` key in the body
    #[default]
    AlwaysOk,
    /// Same body, but 422 for malformed input and 500 for inference faults
    StatusCodes,
}

impl std::str::FromStr for ErrorContract {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "always_ok" => Ok(ErrorContract::AlwaysOk),
            "status_codes" => Ok(ErrorContract::StatusCodes),
            other => Err(Error::Config(format!(
                "unknown error contract '{}' (expected always_ok or status_codes)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub error_contract: ErrorContract,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            error_contract: ErrorContract::AlwaysOk,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub n_trees: usize,
    pub seed: u64,
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
    pub max_depth: Option<usize>,
    /// Dataset field delimiter
    pub delimiter: char,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            seed: 42,
            test_fraction: 0.2,
            max_depth: None,
            delimiter: ',',
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl HearingConfig {
    /// Load configuration from an explicit file, or from the per-user default
    /// location if none is given.
    ///
    /// An explicit file that cannot be read or parsed is an error. A missing
    /// default file falls back to compiled defaults with a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                warn!(
                    "No config file at {}, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: HearingConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fraction = self.training.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(Error::Config(format!(
                "training.test_fraction must be in (0, 1), got {}",
                fraction
            )));
        }
        if self.training.n_trees == 0 {
            return Err(Error::Config("training.n_trees must be at least 1".to_string()));
        }
        if !self.training.delimiter.is_ascii() {
            return Err(Error::Config("training.delimiter must be ASCII".to_string()));
        }
        Ok(())
    }
}

/// `<config dir>/hearing/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hearing").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_defaults() {
        let config = HearingConfig::default();
        assert_eq!(config.model_path, PathBuf::from("hearing_model.json"));
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.api.error_contract, ErrorContract::AlwaysOk);
        assert_eq!(config.training.n_trees, 200);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.test_fraction, 0.2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = HearingConfig::from_toml_str(
            r#"
            model_path = "/srv/models/hearing.json"

            [api]
            port = 9100
            error_contract = "status_codes"
            "#,
        )
        .unwrap();

        assert_eq!(config.model_path, PathBuf::from("/srv/models/hearing.json"));
        assert_eq!(config.api.port, 9100);
        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(config.api.error_contract, ErrorContract::StatusCodes);
        assert_eq!(config.training, TrainingConfig::default());
    }

    #[test]
    fn test_invalid_test_fraction_rejected() {
        let err = HearingConfig::from_toml_str("[training]\ntest_fraction = 1.5\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = HearingConfig::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_error_contract_from_str() {
        assert_eq!("always_ok".parse::<ErrorContract>().unwrap(), ErrorContract::AlwaysOk);
        assert_eq!(
            "status_codes".parse::<ErrorContract>().unwrap(),
            ErrorContract::StatusCodes
        );
        assert!("teapot".parse::<ErrorContract>().is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    #[serial]
    fn test_default_location_missing_falls_back() {
        let dir = tempfile::TempDir::new().unwrap();
        env::set_var("XDG_CONFIG_HOME", dir.path());

        let config = HearingConfig::load(None).unwrap();
        assert_eq!(config, HearingConfig::default());

        env::remove_var("XDG_CONFIG_HOME");
    }

    #[cfg(target_os = "linux")]
    #[test]
    #[serial]
    fn test_default_location_is_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_dir = dir.path().join("hearing");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.toml"), "[logging]\nlevel = \"debug\"\n").unwrap();
        env::set_var("XDG_CONFIG_HOME", dir.path());

        let config = HearingConfig::load(None).unwrap();
        assert_eq!(config.logging.level, "debug");

        env::remove_var("XDG_CONFIG_HOME");
    }
}
