// ABOUTME: Server configuration for SSH connections.
// ABOUTME: Parses formats like "host", "user@host", "host:port", "user@host:port".

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::EnvValue;
use crate::error::Result;
use crate::ssh::{Credential, SessionConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    /// Password, either literal or read from the environment.
    #[serde(default)]
    pub password: Option<EnvValue>,
    /// Private key file. `~/` is expanded against `$HOME`.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    #[serde(default = "default_trust_first_connection")]
    pub trust_first_connection: bool,
    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,
}

fn default_port() -> u16 {
    22
}

fn default_trust_first_connection() -> bool {
    true
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

impl ServerConfig {
    /// A server on port 22 with default connection settings.
    pub fn new(host: impl Into<String>) -> Self {
        ServerConfig {
            host: host.into(),
            port: default_port(),
            user: None,
            password: None,
            key_path: None,
            trust_first_connection: default_trust_first_connection(),
            command_timeout: default_command_timeout(),
        }
    }

    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("server address cannot be empty".to_string());
        }

        // Parse format: [user@]host[:port]
        let (user_part, rest) = match s.split_once('@') {
            Some((user, rest)) => (Some(user), rest),
            None => (None, s),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {port_str}"))?;
                (host, port)
            }
            None => (rest, default_port()),
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }
        if user_part.is_some_and(str::is_empty) {
            return Err("user cannot be empty".to_string());
        }

        Ok(ServerConfig {
            port,
            user: user_part.map(str::to_string),
            ..ServerConfig::new(host)
        })
    }

    /// Login user: the configured one, else `$USER`, else `root`.
    pub fn login_user(&self) -> String {
        self.user
            .clone()
            .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "root".to_string()))
    }

    /// Build the SSH session settings, resolving any password reference.
    ///
    /// A password takes precedence over `key_path`; with neither set the
    /// agent and default key files are tried.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let credential = match (&self.password, &self.key_path) {
            (Some(password), _) => Credential::Password(password.resolve()?),
            (None, Some(path)) => Credential::KeyFile(expand_home(path)),
            (None, None) => Credential::Auto,
        };

        Ok(SessionConfig::new(&self.host, self.login_user())
            .port(self.port)
            .credential(credential)
            .trust_on_first_use(self.trust_first_connection)
            .command_timeout(self.command_timeout))
    }
}

fn expand_home(path: &std::path::Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    path.to_path_buf()
}
