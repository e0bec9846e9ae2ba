use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub backend: BackendConfig,
  pub default_project: Option<String>,
  /// Custom title for the header (defaults to the backend domain if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Where CSV exports land (defaults to the user's download directory)
  pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  /// Base URL of the Frappe backend serving the sprint-data RPC
  pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { enabled: true }
  }
}

fn default_true() -> bool {
  true
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./z9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/z9s/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/z9s/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("z9s.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("z9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the backend API token from environment variables.
  ///
  /// Checks Z9S_TOKEN first, then ZENHUB_DASH_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("Z9S_TOKEN")
      .or_else(|_| std::env::var("ZENHUB_DASH_TOKEN"))
      .map_err(|_| eyre!("API token not found. Set Z9S_TOKEN or ZENHUB_DASH_TOKEN."))
  }

  /// Directory where exported CSV files are written.
  pub fn export_dir(&self) -> PathBuf {
    self
      .export_dir
      .clone()
      .or_else(dirs::download_dir)
      .unwrap_or_else(|| PathBuf::from("."))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str(
      "backend:\n  url: https://pm.example.com\ndefault_project: PROJ-1\n",
    )
    .unwrap();

    assert_eq!(config.backend.url, "https://pm.example.com");
    assert_eq!(config.default_project.as_deref(), Some("PROJ-1"));
    assert!(config.cache.enabled);
  }

  #[test]
  fn test_cache_can_be_disabled() {
    let config: Config = serde_yaml::from_str(
      "backend:\n  url: https://pm.example.com\ncache:\n  enabled: false\n",
    )
    .unwrap();

    assert!(!config.cache.enabled);
  }
}
