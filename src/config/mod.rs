// ABOUTME: Configuration types and parsing for slotswap.yml.
// ABOUTME: Handles YAML parsing, validation, discovery, and destination merging.

mod deserialize;
mod env_value;
mod health_check;
mod init;
mod server;

pub use env_value::EnvValue;
pub use health_check::HealthCheckConfig;
pub use init::init_config;
pub use server::ServerConfig;

use deserialize::{
    deserialize_root, deserialize_root_option, deserialize_server, deserialize_server_option,
};

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::transport::{DEFAULT_PARALLELISM, MAX_PARALLELISM};
use crate::types::{DEFAULT_BACKUP_SLOT, DEFAULT_STAGING_SLOT, RemotePath, SlotLayout};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "slotswap.yml";
pub const CONFIG_FILENAME_ALT: &str = "slotswap.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".slotswap/config.yml";

pub const DEFAULT_POOL_SIZE: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_server")]
    pub server: ServerConfig,

    /// Deployment root on the server; production content lives directly in it.
    #[serde(deserialize_with = "deserialize_root")]
    pub root: RemotePath,

    /// Local artifact directory, relative to the config file.
    #[serde(default)]
    pub source: Option<PathBuf>,

    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    #[serde(default)]
    pub slots: SlotNames,

    #[serde(default)]
    pub health_check: HealthCheckConfig,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub destinations: HashMap<String, Destination>,

    /// Directory the config was loaded from.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlotNames {
    #[serde(default = "default_staging")]
    pub staging: String,
    #[serde(default = "default_backup")]
    pub backup: String,
}

impl Default for SlotNames {
    fn default() -> Self {
        Self {
            staging: default_staging(),
            backup: default_backup(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Destination {
    #[serde(default, deserialize_with = "deserialize_root_option")]
    pub root: Option<RemotePath>,

    #[serde(default, deserialize_with = "deserialize_server_option")]
    pub server: Option<ServerConfig>,

    #[serde(default)]
    pub source: Option<PathBuf>,

    #[serde(default)]
    pub health_check: Option<HealthCheckConfig>,
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

fn default_parallelism() -> usize {
    DEFAULT_PARALLELISM
}

fn default_staging() -> String {
    DEFAULT_STAGING_SLOT.to_string()
}

fn default_backup() -> String {
    DEFAULT_BACKUP_SLOT.to_string()
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validated()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.config_dir = path.parent().map(|dir| {
            // `.slotswap/config.yml` is relative to the project, not `.slotswap/`.
            if dir.file_name().is_some_and(|name| name == ".slotswap") {
                dir.parent().unwrap_or(dir).to_path_buf()
            } else {
                dir.to_path_buf()
            }
        });
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "using config file");
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn for_destination(&self, name: &str) -> Result<Config> {
        let dest = self
            .destinations
            .get(name)
            .ok_or_else(|| Error::UnknownDestination(name.to_string()))?;

        let mut merged = self.clone();

        if let Some(ref server) = dest.server {
            merged.server = server.clone();
        }

        if let Some(ref root) = dest.root {
            merged.root = root.clone();
        }

        if let Some(ref source) = dest.source {
            merged.source = Some(source.clone());
        }

        if let Some(ref health_check) = dest.health_check {
            merged.health_check = health_check.clone();
        }

        merged.validated()
    }

    /// Slot directories for the configured root.
    pub fn layout(&self) -> Result<SlotLayout> {
        Ok(SlotLayout::new(
            self.root.clone(),
            &self.slots.staging,
            &self.slots.backup,
        )?)
    }

    /// Configured artifact directory resolved against the config location.
    pub fn source_path(&self) -> Option<PathBuf> {
        self.source.as_ref().map(|source| match &self.config_dir {
            Some(dir) if source.is_relative() => dir.join(source),
            _ => source.clone(),
        })
    }

    fn validated(mut self) -> Result<Self> {
        if self.root.is_root() {
            return Err(Error::InvalidConfig(
                "root cannot be the filesystem root".to_string(),
            ));
        }
        self.layout()?;

        self.pool_size = self.pool_size.max(1);
        if !(1..=MAX_PARALLELISM).contains(&self.parallelism) {
            let clamped = self.parallelism.clamp(1, MAX_PARALLELISM);
            tracing::warn!(
                configured = self.parallelism,
                clamped,
                "parallelism out of range"
            );
            self.parallelism = clamped;
        }
        Ok(self)
    }

    pub fn template() -> Self {
        Config {
            server: ServerConfig {
                user: Some("deploy".to_string()),
                ..ServerConfig::new("server.example.com")
            },
            root: RemotePath::new("/var/www/site"),
            source: Some(PathBuf::from("dist")),
            pool_size: DEFAULT_POOL_SIZE,
            parallelism: DEFAULT_PARALLELISM,
            slots: SlotNames::default(),
            health_check: HealthCheckConfig::default(),
            retry: RetryPolicy::default(),
            destinations: HashMap::new(),
            config_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "server: deploy@web1.example.com\nroot: /var/www/site\n";

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.server.host, "web1.example.com");
        assert_eq!(config.root.as_str(), "/var/www/site");
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.parallelism, DEFAULT_PARALLELISM);
        assert_eq!(config.slots, SlotNames::default());
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.source.is_none());
    }

    #[test]
    fn blank_root_is_rejected() {
        let err = Config::from_yaml("server: web1\nroot: '  '\n").unwrap_err();
        assert!(err.to_string().contains("root cannot be empty"));
    }

    #[test]
    fn filesystem_root_is_rejected() {
        let err = Config::from_yaml("server: web1\nroot: /\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn colliding_slots_are_rejected() {
        let yaml = format!("{MINIMAL}slots: {{ staging: same, backup: same }}\n");
        assert!(matches!(Config::from_yaml(&yaml), Err(Error::Slot(_))));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let yaml = format!("{MINIMAL}pool_size: 0\nparallelism: 500\n");
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.pool_size, 1);
        assert_eq!(config.parallelism, MAX_PARALLELISM);
    }

    #[test]
    fn destination_overrides_server_and_root() {
        let yaml = format!(
            "{MINIMAL}destinations:\n  production:\n    root: /var/www/prod\n    server: prod.example.com:2222\n    health_check: {{ paths: [app.js] }}\n"
        );
        let config = Config::from_yaml(&yaml).unwrap();
        let prod = config.for_destination("production").unwrap();
        assert_eq!(prod.root.as_str(), "/var/www/prod");
        assert_eq!(prod.server.host, "prod.example.com");
        assert_eq!(prod.server.port, 2222);
        assert_eq!(prod.health_check.paths().head, "app.js");
        assert_eq!(config.root.as_str(), "/var/www/site");
    }

    #[test]
    fn unknown_destination_is_an_error() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert!(matches!(
            config.for_destination("nope"),
            Err(Error::UnknownDestination(_))
        ));
    }

    #[test]
    fn relative_source_resolves_against_config_dir() {
        let mut config = Config::from_yaml(&format!("{MINIMAL}source: dist\n")).unwrap();
        config.config_dir = Some(PathBuf::from("/projects/site"));
        assert_eq!(config.source_path(), Some(PathBuf::from("/projects/site/dist")));
    }

    #[test]
    fn template_is_valid() {
        let template = Config::template();
        assert!(template.layout().is_ok());
        assert_eq!(template.server.user.as_deref(), Some("deploy"));
    }
}
