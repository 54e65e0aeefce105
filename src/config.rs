use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::PitdeltaError;
use crate::analysis::ThrottleTraceMode;
use crate::report::OutputFormat;
use crate::session::FileSessionRepository;

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_DRIVER: &str = "VER";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Root of the session repository, the user cache directory when unset
    pub data_dir: Option<PathBuf>,
    pub driver: String,
    pub throttle_mode: ThrottleTraceMode,
    pub output_format: OutputFormat,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            driver: DEFAULT_DRIVER.to_string(),
            throttle_mode: ThrottleTraceMode::Raw,
            output_format: OutputFormat::Text,
        }
    }
}

impl AnalysisConfig {
    pub fn config_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("pitdelta").join(CONFIG_FILE_NAME))
    }

    pub fn from_local_file() -> Option<Self> {
        Self::from_file(&Self::config_path()?)
    }

    /// Reads a config file, a missing or unreadable file yields None
    pub fn from_file(config_path: &PathBuf) -> Option<Self> {
        if !config_path.exists() {
            return None;
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| warn!("Could not open config file {:?}: {}", config_path, e))
            .ok()?;
        serde_json::from_reader(file)
            .map_err(|e| warn!("Could not parse config file {:?}: {}", config_path, e))
            .ok()
    }

    pub fn save(&self) -> Result<PathBuf, PitdeltaError> {
        let config_path = Self::config_path().ok_or(PitdeltaError::NoConfigDir)?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &PathBuf) -> Result<(), PitdeltaError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PitdeltaError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| PitdeltaError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| PitdeltaError::ConfigSerializeError { source: e })
    }

    pub fn data_dir(&self) -> Result<PathBuf, PitdeltaError> {
        match &self.data_dir {
            Some(data_dir) => Ok(data_dir.clone()),
            None => FileSessionRepository::default_root(),
        }
    }
}
