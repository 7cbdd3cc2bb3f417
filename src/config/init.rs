// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates slotswap.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::RemotePath;

use super::{CONFIG_FILENAME, Config, ServerConfig};

pub fn init_config(dir: &Path, host: Option<&str>, root: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(h) = host {
        let mut server = ServerConfig::parse(h).map_err(Error::InvalidConfig)?;
        server.user = server.user.or(config.server.user);
        config.server = server;
    }

    if let Some(r) = root {
        if r.trim().is_empty() {
            return Err(Error::InvalidConfig("root cannot be empty".to_string()));
        }
        config.root = RemotePath::new(r);
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;
    tracing::debug!(path = %config_path.display(), "wrote config template");

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"server:
  host: {}
  port: {}
  user: {}
  # Password auth; omit to use the SSH agent or key_path
  # password: {{ env: SLOTSWAP_PASSWORD }}
  # key_path: ~/.ssh/id_ed25519
  # SSH host key verification (default: true, Trust-On-First-Use)
  # Set to false to require a pre-populated ~/.ssh/known_hosts
  # trust_first_connection: false
root: {}
source: {}
# pool_size: {}
# parallelism: {}
# slots: {{ staging: {}, backup: {} }}
health_check:
  paths: [index.html]
# retry: {{ max_retries: 3, base_delay: 1s }}
"#,
        config.server.host,
        config.server.port,
        config.server.user.as_deref().unwrap_or("deploy"),
        config.root,
        config
            .source
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "dist".to_string()),
        config.pool_size,
        config.parallelism,
        config.slots.staging,
        config.slots.backup,
    )
}
