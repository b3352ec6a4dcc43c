use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Cache generation identifier, e.g. "polleria-mvp-cache-v3".
  /// Bump the version suffix whenever the cached assets change; old
  /// generations are purged at activation.
  pub cache_name: String,
  /// Origin the controller is scoped to, e.g. "https://shop.example.com"
  pub origin: String,
  /// App-shell URLs cached during install (origin-relative or absolute)
  #[serde(default)]
  pub app_shell: Vec<String>,
  /// URL of a cached page served when an offline navigation has no exact
  /// cache match (e.g. "/offline.html")
  pub offline_page: Option<String>,
  #[serde(default)]
  pub install_policy: InstallPolicy,
}

/// What to do when app-shell population fails during install.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InstallPolicy {
  /// Log the failure and continue; a partially populated generation may
  /// still activate
  #[default]
  FailOpen,
  /// Treat shell population failure as an install failure
  FailClosed,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./shellcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/shellcache/config.yaml
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
        "No configuration file found. Create one at ~/.config/shellcache/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("shellcache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("shellcache").join("config.yaml");
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
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_full_config() {
    let yaml = r#"
cache_name: polleria-mvp-cache-v3
origin: https://shop.example.com
app_shell:
  - /static/css/estilo.css
  - /static/js/main.js
  - /static/img/logo.png
  - https://cdnjs.cloudflare.com/ajax/libs/moment.js/2.29.4/moment-with-locales.min.js
offline_page: /offline.html
install_policy: fail_closed
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.cache_name, "polleria-mvp-cache-v3");
    assert_eq!(config.app_shell.len(), 4);
    assert_eq!(config.offline_page.as_deref(), Some("/offline.html"));
    assert_eq!(config.install_policy, InstallPolicy::FailClosed);
  }

  #[test]
  fn test_install_policy_defaults_to_fail_open() {
    let yaml = r#"
cache_name: shop-cache-v1
origin: https://shop.example.com
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.install_policy, InstallPolicy::FailOpen);
    assert!(config.app_shell.is_empty());
    assert!(config.offline_page.is_none());
  }
}
