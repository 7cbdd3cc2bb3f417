// ABOUTME: Deployment slot layout under a remote root.
// ABOUTME: Production is the root itself; staging and backup are reserved child directories.

use std::fmt;
use thiserror::Error;

use super::RemotePath;

pub const DEFAULT_STAGING_SLOT: &str = "staging";
pub const DEFAULT_BACKUP_SLOT: &str = "backup";

/// One of the three fixed-purpose subtrees of a deployment root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Live production content (the root itself, minus the reserved slots).
    Base,
    /// Upload target for the next release.
    Staging,
    /// Holding area for the previous production release.
    Backup,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Base => write!(f, "base"),
            Slot::Staging => write!(f, "staging"),
            Slot::Backup => write!(f, "backup"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("{slot} slot name cannot be empty")]
    Empty { slot: Slot },

    #[error("{slot} slot name must be a single path segment: '{name}'")]
    NotASegment { slot: Slot, name: String },

    #[error("staging and backup slots must differ (both '{0}')")]
    Collision(String),
}

/// Resolved slot directories for one deployment root.
///
/// Staging and backup are distinct direct children of the root, so no slot
/// is ever nested inside another reserved slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotLayout {
    base: RemotePath,
    staging: RemotePath,
    backup: RemotePath,
}

impl SlotLayout {
    pub fn new(root: RemotePath, staging: &str, backup: &str) -> Result<Self, SlotError> {
        validate_name(Slot::Staging, staging)?;
        validate_name(Slot::Backup, backup)?;
        if staging.eq_ignore_ascii_case(backup) {
            return Err(SlotError::Collision(staging.to_string()));
        }

        Ok(Self {
            staging: root.join(staging),
            backup: root.join(backup),
            base: root,
        })
    }

    /// Layout using the default `staging` / `backup` names.
    pub fn with_defaults(root: RemotePath) -> Self {
        Self {
            staging: root.join(DEFAULT_STAGING_SLOT),
            backup: root.join(DEFAULT_BACKUP_SLOT),
            base: root,
        }
    }

    pub fn path(&self, slot: Slot) -> &RemotePath {
        match slot {
            Slot::Base => &self.base,
            Slot::Staging => &self.staging,
            Slot::Backup => &self.backup,
        }
    }

    pub fn base(&self) -> &RemotePath {
        &self.base
    }

    pub fn staging(&self) -> &RemotePath {
        &self.staging
    }

    pub fn backup(&self) -> &RemotePath {
        &self.backup
    }

    /// Whether `path` is the staging or backup directory itself.
    pub fn is_reserved(&self, path: &RemotePath) -> bool {
        path.as_str().eq_ignore_ascii_case(self.staging.as_str())
            || path.as_str().eq_ignore_ascii_case(self.backup.as_str())
    }
}

fn validate_name(slot: Slot, name: &str) -> Result<(), SlotError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SlotError::Empty { slot });
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed == "." || trimmed == ".." {
        return Err(SlotError::NotASegment {
            slot,
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_places_slots_under_root() {
        let layout = SlotLayout::new(RemotePath::new("/site"), "slot1", "slot2").unwrap();
        assert_eq!(layout.base().as_str(), "/site");
        assert_eq!(layout.staging().as_str(), "/site/slot1");
        assert_eq!(layout.backup().as_str(), "/site/slot2");
    }

    #[test]
    fn nested_slot_names_are_rejected() {
        let err = SlotLayout::new(RemotePath::new("/site"), "a/b", "backup").unwrap_err();
        assert!(matches!(err, SlotError::NotASegment { slot: Slot::Staging, .. }));
    }

    #[test]
    fn identical_slot_names_are_rejected() {
        let err = SlotLayout::new(RemotePath::new("/site"), "Slot", "slot").unwrap_err();
        assert_eq!(err, SlotError::Collision("Slot".to_string()));
    }

    #[test]
    fn reserved_check_ignores_case() {
        let layout = SlotLayout::with_defaults(RemotePath::new("/site"));
        assert!(layout.is_reserved(&RemotePath::new("/site/Staging")));
        assert!(layout.is_reserved(&RemotePath::new("/site/backup")));
        assert!(!layout.is_reserved(&RemotePath::new("/site/index.html")));
    }
}
