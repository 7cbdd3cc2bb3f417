// ABOUTME: Restores the retained backup into production.
// ABOUTME: Used after a failed health check and by the manual rollback command.

use crate::diagnostics::{Diagnostics, Warning};
use crate::transport::RemoteTransport;
use crate::types::{RemotePath, SlotLayout};

use super::error::DeployError;
use super::outcome::{DeploymentOutcome, Phase};
use super::transitions::reset_directory;

/// Counts from one rollback pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackReport {
    /// Failed production entries moved aside into staging.
    pub parked: usize,
    /// Backup entries moved back into production.
    pub restored: usize,
    /// Steps that failed and were skipped.
    pub failures: usize,
}

impl RollbackReport {
    pub fn is_complete(&self) -> bool {
        self.failures == 0
    }

    pub fn outcome(&self) -> DeploymentOutcome {
        if self.is_complete() {
            DeploymentOutcome::FailedAndRolledBack
        } else {
            DeploymentOutcome::FailedRollbackIncomplete
        }
    }

    fn fail(&mut self, diagnostics: &mut Diagnostics, message: String) {
        tracing::error!(phase = %Phase::Rollback, "{}", message);
        diagnostics.warn(Warning::rollback_item_failed(message));
        self.failures += 1;
    }
}

/// Put the backup slot back into production.
///
/// This:
/// 1. Clears staging
/// 2. Moves the current production entries into staging
/// 3. Moves every backup entry into production
///
/// Every failed step is logged, recorded and counted, and the rollback
/// carries on with the next one.
pub async fn restore_backup<T: RemoteTransport + ?Sized>(
    transport: &T,
    layout: &SlotLayout,
    diagnostics: &mut Diagnostics,
) -> RollbackReport {
    let phase = Phase::Rollback;
    let mut report = RollbackReport::default();
    tracing::info!(phase = %phase, backup = %layout.backup(), "restoring production from backup");

    if let Err(e) = reset_directory(transport, layout.staging()).await {
        report.fail(
            diagnostics,
            format!("failed to clear staging {}: {}", layout.staging(), e),
        );
    }

    match transport.list(layout.base()).await {
        Ok(entries) => {
            for entry in entries.into_iter().filter(|e| !layout.is_reserved(&e.path)) {
                match relocate(transport, &entry.path, layout.base(), layout.staging()).await {
                    Ok(()) => report.parked += 1,
                    Err(message) => report.fail(diagnostics, message),
                }
            }
        }
        Err(e) => report.fail(
            diagnostics,
            format!("failed to list production {}: {}", layout.base(), e),
        ),
    }

    match transport.list(layout.backup()).await {
        Ok(entries) => {
            for entry in entries {
                match relocate(transport, &entry.path, layout.backup(), layout.base()).await {
                    Ok(()) => report.restored += 1,
                    Err(message) => report.fail(diagnostics, message),
                }
            }
        }
        Err(e) => report.fail(
            diagnostics,
            format!("failed to list backup {}: {}", layout.backup(), e),
        ),
    }

    tracing::info!(
        phase = %phase,
        parked = report.parked,
        restored = report.restored,
        failures = report.failures,
        "rollback finished"
    );
    report
}

/// Fail early when there is nothing to roll back to.
///
/// # Errors
///
/// Returns `DeployError::NoBackup` when the backup slot is missing or empty.
pub async fn ensure_backup<T: RemoteTransport + ?Sized>(
    transport: &T,
    layout: &SlotLayout,
) -> Result<usize, DeployError> {
    let backup = layout.backup();
    let exists = transport
        .directory_exists(backup)
        .await
        .map_err(DeployError::transport(Phase::Rollback))?;
    if !exists {
        return Err(DeployError::NoBackup(backup.clone()));
    }
    let entries = transport
        .list(backup)
        .await
        .map_err(DeployError::transport(Phase::Rollback))?;
    if entries.is_empty() {
        return Err(DeployError::NoBackup(backup.clone()));
    }
    Ok(entries.len())
}

async fn relocate<T: RemoteTransport + ?Sized>(
    transport: &T,
    path: &RemotePath,
    from_root: &RemotePath,
    to_root: &RemotePath,
) -> Result<(), String> {
    let target = path
        .rebase(from_root, to_root)
        .ok_or_else(|| format!("{} is not under {}", path, from_root))?;
    transport
        .move_entry(path, &target)
        .await
        .map_err(|e| format!("failed to move {} to {}: {}", path, target, e))?;
    tracing::debug!(phase = %Phase::Rollback, from = %path, to = %target, "moved entry");
    Ok(())
}
