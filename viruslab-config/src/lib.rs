//! # Viruslab Configuration System
//!
//! Hierarchical configuration for both game engines, the in-process ledger
//! emulation and telemetry.
//!
//! ## Features
//! - **Unified Configuration**: one document feeds every crate
//! - **Validation**: probabilities, periods and economy bounds checked at load
//! - **Environment Awareness**: per-environment YAML overrides and `VIRUSLAB_*` variables

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod ledger;
mod local;
mod simulator;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use ledger::LedgerConfig;
pub use local::LocalConfig;
pub use simulator::ChaosConfig;
pub use simulator::SimulatorConfig;
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/viruslab.yaml";
const ENV_PREFIX: &str = "VIRUSLAB_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
pub struct ViruslabConfig {
    /// Offline simulation engine.
    #[validate(nested)]
    #[serde(default)]
    pub local: LocalConfig,

    /// Ledger-backed engine.
    #[validate(nested)]
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// In-process ledger emulation.
    #[validate(nested)]
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Logging and metrics.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ViruslabConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default Values
    /// 2. `config/viruslab.yaml` - Base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - Environment-specific overrides (`VIRUSLAB_ENV`).
    /// 4. `VIRUSLAB_*` environment variables, `__` separating nested keys.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ViruslabConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        } else {
            tracing::debug!("{BASE_FILE} not found, using default configuration");
        }

        let env = std::env::var("VIRUSLAB_ENV").unwrap_or_else(|_| "development".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::extract(figment)
    }

    /// Load configuration from a specific path, still honoring environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Self::extract(
            Figment::from(Serialized::defaults(ViruslabConfig::default())).merge(Yaml::file(path)),
        )
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
