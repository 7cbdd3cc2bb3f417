// ABOUTME: Validated domain types for remote deployment paths.
// ABOUTME: RemotePath normalization and the staging/backup slot layout.

mod remote_path;
mod slot;

pub use remote_path::RemotePath;
pub use slot::{DEFAULT_BACKUP_SLOT, DEFAULT_STAGING_SLOT, Slot, SlotError, SlotLayout};
