// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles the deployment root and server entries given as strings or maps.

use serde::Deserialize;

use super::ServerConfig;
use crate::types::RemotePath;

pub fn deserialize_root<'de, D>(deserializer: D) -> Result<RemotePath, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_root(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_root_option<'de, D>(deserializer: D) -> Result<Option<RemotePath>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| parse_root(&s))
        .transpose()
        .map_err(serde::de::Error::custom)
}

pub fn deserialize_server<'de, D>(deserializer: D) -> Result<ServerConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    ServerEntry::deserialize(deserializer)?
        .into_server_config()
        .map_err(serde::de::Error::custom)
}

pub fn deserialize_server_option<'de, D>(deserializer: D) -> Result<Option<ServerConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<ServerEntry> = Option::deserialize(deserializer)?;
    opt.map(ServerEntry::into_server_config)
        .transpose()
        .map_err(serde::de::Error::custom)
}

fn parse_root(s: &str) -> Result<RemotePath, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("root cannot be empty".to_string());
    }
    Ok(RemotePath::new(s))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerEntry {
    Simple(String),
    Detailed(ServerConfig),
}

impl ServerEntry {
    fn into_server_config(self) -> Result<ServerConfig, String> {
        match self {
            ServerEntry::Simple(s) => ServerConfig::parse(&s),
            ServerEntry::Detailed(c) => Ok(c),
        }
    }
}
