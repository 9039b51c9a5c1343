use crate::error::{Result, WikiError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for mdwiki
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WikiConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Site-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display name of the wiki
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Route prefix prepended to a slug in generated wiki-link anchors
    #[serde(default = "default_page_url_prefix")]
    pub page_url_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault directory. Relative paths are resolved against the config file's directory.
    #[serde(default = "default_vault_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file, or `:memory:`
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_results_per_page")]
    pub results_per_page: usize,
    /// Maximum excerpt length in characters
    #[serde(default = "default_excerpt_length")]
    pub excerpt_length: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_site_name() -> String {
    "MD-WIKI".to_string()
}

fn default_page_url_prefix() -> String {
    "/page/".to_string()
}

fn default_vault_path() -> PathBuf {
    PathBuf::from("vault")
}

fn default_database() -> PathBuf {
    PathBuf::from("mdwiki.db")
}

fn default_results_per_page() -> usize {
    10
}

fn default_excerpt_length() -> usize {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            page_url_prefix: default_page_url_prefix(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: default_vault_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_per_page: default_results_per_page(),
            excerpt_length: default_excerpt_length(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl WikiConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: WikiConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load config from a file and resolve relative paths against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WikiError::io(path, e))?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Make the vault and database paths absolute relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.vault.path.is_relative() {
            self.vault.path = base.join(&self.vault.path);
        }
        if self.storage.database != Path::new(":memory:") && self.storage.database.is_relative() {
            self.storage.database = base.join(&self.storage.database);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = WikiConfig::from_yaml("{}").unwrap();
        assert_eq!(config.site.page_url_prefix, "/page/");
        assert_eq!(config.search.results_per_page, 10);
        assert_eq!(config.search.excerpt_length, 200);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "vault:\n  path: /srv/notes\nsearch:\n  results_per_page: 25\n";
        let config = WikiConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.vault.path, PathBuf::from("/srv/notes"));
        assert_eq!(config.search.results_per_page, 25);
        assert_eq!(config.search.excerpt_length, 200);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = WikiConfig::from_yaml("search: [1, 2").unwrap_err();
        assert!(matches!(err, WikiError::Config(_)));
    }

    #[test]
    fn test_resolve_paths() {
        let mut config = WikiConfig::default();
        config.resolve_paths(Path::new("/etc/mdwiki"));
        assert_eq!(config.vault.path, PathBuf::from("/etc/mdwiki/vault"));
        assert_eq!(config.storage.database, PathBuf::from("/etc/mdwiki/mdwiki.db"));

        let mut config = WikiConfig::default();
        config.storage.database = PathBuf::from(":memory:");
        config.resolve_paths(Path::new("/etc/mdwiki"));
        assert_eq!(config.storage.database, PathBuf::from(":memory:"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = WikiConfig::default();
        let yaml = config.to_yaml().unwrap();
        let parsed = WikiConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.site.name, "MD-WIKI");
    }
}
