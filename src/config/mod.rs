use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory scanned for icon images (autocomplete source).
    /// Defaults to <data_dir>/paddo/icons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons_dir: Option<PathBuf>,

    /// Program used to open tile URLs. When unset, common openers are
    /// tried in order (xdg-open, open, wslview).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_command: Option<String>,

    /// Ask before deleting a tile.
    #[serde(default = "default_true")]
    pub confirm_delete: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            icons_dir: None,
            open_command: None,
            confirm_delete: true,
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("paddo");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Effective icon directory: configured, or the default data path.
    pub fn icons_dir(&self) -> PathBuf {
        self.icons_dir.clone().unwrap_or_else(|| {
            crate::icons::default_icons_dir().unwrap_or_else(|_| PathBuf::from("icons"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            icons_dir: Some(PathBuf::from("/srv/icons")),
            open_command: Some("firefox".to_string()),
            confirm_delete: false,
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.icons_dir, deserialized.icons_dir);
        assert_eq!(config.open_command, deserialized.open_command);
        assert!(!deserialized.confirm_delete);
    }

    #[test]
    fn test_confirm_delete_defaults_on() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.confirm_delete);
    }
}
