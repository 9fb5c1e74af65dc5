use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::Opponent;
use crate::error::ConfigError;
use crate::types::Side;

const DEFAULT_TIME_LIMIT_SECS: f64 = 5.0;

/// Engine settings, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wall-clock budget for every machine move.
    pub time_limit_secs: f64,
    pub opponent: Opponent,
    /// Side played by the human.
    pub human: Side,
    /// Starting layout, the standard opening when absent.
    pub layout: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            opponent: Opponent::default(),
            human: Side::Black,
            layout: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_secs <= 0.0 || Duration::try_from_secs_f64(self.time_limit_secs).is_err() {
            return Err(ConfigError::Validation(
                "time_limit_secs must be a positive number".into(),
            ));
        }
        if let Opponent::Minimax(minimax) = &self.opponent
            && minimax.depth == 0
        {
            return Err(ConfigError::Validation(
                "opponent.depth must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Falls back to the default budget when `time_limit_secs` is unusable.
    pub fn time_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_limit_secs)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_TIME_LIMIT_SECS))
    }
}
