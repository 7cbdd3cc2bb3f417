// ABOUTME: Read-only inspection of the three deployment slots.
// ABOUTME: Reports whether each slot exists and how many top-level entries it holds.

use serde::Serialize;

use crate::transport::RemoteTransport;
use crate::types::{RemotePath, Slot, SlotLayout};

use super::error::DeployError;
use super::outcome::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    #[serde(serialize_with = "serialize_slot")]
    pub slot: Slot,
    pub path: RemotePath,
    pub exists: bool,
    /// Top-level entries; production excludes the reserved slot directories.
    pub entries: usize,
}

fn serialize_slot<S: serde::Serializer>(slot: &Slot, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(slot)
}

/// Inspect production, staging and backup in that order.
///
/// # Errors
///
/// Returns the first transport failure, tagged with the `EnsureSlots` phase.
pub async fn inspect_slots<T: RemoteTransport + ?Sized>(
    transport: &T,
    layout: &SlotLayout,
) -> Result<Vec<SlotStatus>, DeployError> {
    let mut report = Vec::with_capacity(3);
    for slot in [Slot::Base, Slot::Staging, Slot::Backup] {
        let path = layout.path(slot);
        let exists = transport
            .directory_exists(path)
            .await
            .map_err(DeployError::transport(Phase::EnsureSlots))?;
        let entries = if exists {
            transport
                .list(path)
                .await
                .map_err(DeployError::transport(Phase::EnsureSlots))?
                .iter()
                .filter(|entry| !layout.is_reserved(&entry.path))
                .count()
        } else {
            0
        };
        tracing::debug!(slot = %slot, path = %path, exists, entries, "inspected slot");
        report.push(SlotStatus {
            slot,
            path: path.clone(),
            exists,
            entries,
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    #[tokio::test]
    async fn counts_exclude_reserved_slots() {
        let transport = MemoryTransport::new()
            .with_file("/site/index.html", "v1")
            .with_file("/site/app.js", "v1")
            .with_file("/site/backup/index.html", "v0")
            .with_directory("/site/staging");
        let layout = SlotLayout::with_defaults(RemotePath::new("/site"));

        let status = inspect_slots(&transport, &layout).await.unwrap();
        let counts: Vec<_> = status.iter().map(|s| (s.slot, s.exists, s.entries)).collect();
        assert_eq!(
            counts,
            vec![
                (Slot::Base, true, 2),
                (Slot::Staging, true, 0),
                (Slot::Backup, true, 1),
            ]
        );
    }

    #[tokio::test]
    async fn missing_root_reports_nothing() {
        let layout = SlotLayout::with_defaults(RemotePath::new("/site"));
        let status = inspect_slots(&MemoryTransport::new(), &layout).await.unwrap();
        assert!(status.iter().all(|s| !s.exists && s.entries == 0));
    }
}
