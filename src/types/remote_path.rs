// ABOUTME: Normalized absolute paths on the remote host.
// ABOUTME: Construction canonicalizes separators so every RemotePath compares by value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An absolute, slash-separated path on the remote host.
///
/// Always begins with `/`, never contains doubled separators and has no
/// trailing separator except for the root itself. Backslashes are treated
/// as separators so paths built on Windows normalize to the same value.
/// Segment text is kept verbatim, including surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(normalize(path.as_ref()))
    }

    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Append a relative path. Leading separators on `relative` are ignored.
    pub fn join(&self, relative: impl AsRef<str>) -> Self {
        Self::new(format!("{}/{}", self.0, relative.as_ref()))
    }

    /// The containing directory, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// The last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    /// Whether `base` is this path or one of its ancestors (segment-aware).
    pub fn starts_with(&self, base: &RemotePath) -> bool {
        if base.is_root() || self == base {
            return true;
        }
        self.0
            .strip_prefix(base.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// The path relative to `base`, without a leading separator.
    ///
    /// Returns `None` if `base` is not an ancestor. Equal paths yield `""`.
    pub fn strip_prefix(&self, base: &RemotePath) -> Option<String> {
        if !self.starts_with(base) {
            return None;
        }
        let rest = &self.0[base.0.len()..];
        Some(rest.trim_start_matches('/').to_string())
    }

    /// Re-anchor this path from `from` onto `to`, keeping the relative tail.
    pub fn rebase(&self, from: &RemotePath, to: &RemotePath) -> Option<Self> {
        self.strip_prefix(from).map(|relative| to.join(relative))
    }
}

fn normalize(raw: &str) -> String {
    let replaced = raw.replace('\\', "/");
    let segments: Vec<&str> = replaced
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemotePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RemotePath {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for RemotePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RemotePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}
