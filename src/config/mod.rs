pub mod gesture_config;
pub mod scan_config;

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::config::gesture_config::GestureConfig;
use crate::config::scan_config::ScanConfig;

pub const CONFIG_FILE_NAME: &str = "touchlink_config.json";

/// Overrides the directory the config file lives in.
pub const CONFIG_DIR_ENV: &str = "TOUCHLINK_CONFIG_DIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub gesture: GestureConfig,
}

impl AppConfig {
    /// `$TOUCHLINK_CONFIG_DIR` if set, otherwise `.touchlink` in the working directory.
    pub fn default_dir() -> PathBuf {
        std::env::var_os(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".touchlink"))
    }

    /// Loads the config from `config_dir`, falling back to defaults when no
    /// file exists yet.
    pub async fn load_config(config_dir: &Path) -> Result<Self> {
        let file_path = config_dir.join(CONFIG_FILE_NAME);
        let file_path_str = file_path.to_string_lossy().into_owned();

        if !file_path.exists() {
            warn!("Config file not found at {:?}, using default.", file_path_str);
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(&file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;

        info!("Config loaded from {:?}", file_path_str);
        Ok(config)
    }

    /// Saves the current config to `config_dir`, creating the directory if needed.
    pub async fn save_config(&self, config_dir: &Path) -> Result<()> {
        if let Err(e) = fs::create_dir_all(config_dir).await {
            error!("Failed to create config directory at {:?}: {}", config_dir, e);
            return Err(e.into());
        }

        let file_path = config_dir.join(CONFIG_FILE_NAME);
        let file_path_str = file_path.to_string_lossy().into_owned();

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(&file_path, config_json).await?;
        info!("Config saved to {:?}", file_path_str);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn missing_file_loads_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = AppConfig::load_config(dir.path()).await?;
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.scan.min_rssi, Some(-80));
        assert_eq!(config.scan.scan_duration_secs, 10);
        assert!(config.scan.service_uuids.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn saved_config_loads_back() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config_dir = dir.path().join("nested").join("touchlink");
        let mut config = AppConfig::default();
        config.scan.min_rssi = None;
        config.scan.name_filter = Some("Gear VR".to_string());
        config.scan.service_uuids = vec![Uuid::from_u128(0x4f63756c_7573_2054_6872_65656d6f7465)];
        config.gesture.tap_slop = 14.5;

        config.save_config(&config_dir).await?;
        assert!(config_dir.join(CONFIG_FILE_NAME).exists());

        let loaded = AppConfig::load_config(&config_dir).await?;
        assert_eq!(loaded, config);

        // Saving again over an existing directory is fine.
        loaded.save_config(&config_dir).await?;
        Ok(())
    }

    #[tokio::test]
    async fn partial_file_fills_in_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{ "gesture": { "tap_slop": 3.0 } }"#).await?;

        let loaded = AppConfig::load_config(dir.path()).await?;
        assert_eq!(loaded.gesture.tap_slop, 3.0);
        assert_eq!(loaded.scan, ScanConfig::default());
        Ok(())
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").await?;

        assert!(AppConfig::load_config(dir.path()).await.is_err());
        Ok(())
    }
}
