//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con i parametri di un run
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `out_dir`: Directory di output (default: None = sovrascrive in place)
//! - `plugins`: Catena di plugin (default: gifsicle, jpegtran, optipng, svgo)
//! - `delete2x`: Elimina le varianti `@2x` in modalità in-place (default: false)
//! - `workers`: Numero di file ottimizzati in parallelo (default: 4)
//!
//! ## Esempio di file:
//! ```json
//! {
//!   "out_dir": "build",
//!   "plugins": ["jpegtran", { "pngquant": { "quality": [0.6, 0.8] } }],
//!   "delete2x": true
//! }
//! ```

use crate::error::{OptimizeError, Result as ValidationResult};
use crate::plugin::builtin::DEFAULT_PLUGINS;
use crate::plugin::Selector;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a minification run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output directory for optimized files (None = replace in place)
    pub out_dir: Option<PathBuf>,
    /// Plugin chain, in order
    #[serde(with = "crate::plugin::selector::serde_list")]
    pub plugins: Vec<Selector>,
    /// Drop `@2x` variants when optimizing in place
    pub delete2x: bool,
    /// Number of images optimized concurrently
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: None,
            plugins: DEFAULT_PLUGINS
                .iter()
                .map(|name| Selector::Named(name.to_string()))
                .collect(),
            delete2x: false,
            workers: 4,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> ValidationResult<()> {
        if self.workers == 0 {
            return Err(OptimizeError::Validation("number of workers must be greater than 0".to_string()));
        }

        if self.plugins.is_empty() {
            return Err(OptimizeError::Validation("at least one plugin must be selected".to_string()));
        }

        if let Some(ref out_dir) = self.out_dir {
            if out_dir.exists() && !out_dir.is_dir() {
                return Err(OptimizeError::Validation(format!(
                    "output path is not a directory: {}",
                    out_dir.display()
                )));
            }
        }

        Ok(())
    }

    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("image2min").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 4;
        config.plugins.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_dir_must_not_be_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        let config = Config {
            out_dir: Some(file),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            out_dir: Some(temp_dir.path().join("not-yet-created")),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        let names: Vec<&str> = config.plugins.iter().map(Selector::name).collect();
        assert_eq!(names, vec!["gifsicle", "jpegtran", "optipng", "svgo"]);
        assert!(config.out_dir.is_none());
        assert!(!config.delete2x);
        assert_eq!(config.workers, 4);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            out_dir: Some(PathBuf::from("build")),
            plugins: vec![
                Selector::Named("jpegtran".to_string()),
                Selector::Configured("pngquant".to_string(), json!({ "quality": [0.5, 0.7] })),
            ],
            delete2x: true,
            workers: 8,
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.out_dir, Some(PathBuf::from("build")));
        assert_eq!(loaded_config.plugins, original_config.plugins);
        assert!(loaded_config.delete2x);
        assert_eq!(loaded_config.workers, 8);
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "delete2x": true }"#).await.unwrap();

        let config = Config::from_file(&config_path).await.unwrap();

        assert!(config.delete2x);
        assert_eq!(config.plugins.len(), 4);
        assert_eq!(config.workers, 4);
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("missing.json")).await.unwrap();
        assert_eq!(config.workers, 4);
    }
}
