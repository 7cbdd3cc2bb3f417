// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use crate::diagnostics::{Diagnostics, Warning};
use crate::transport::{RemoteEntry, RemoteTransport, TransferProgress, TreeTransfer};
use crate::types::RemotePath;

use super::Deployment;
use super::error::DeployError;
use super::ledger::{MoveLedger, MoveRecord};
use super::outcome::Phase;
use super::rollback::{RollbackReport, restore_backup};
use super::state::{
    BackedUp, Completed, Initialized, Promoted, SlotsReady, StagingCleared, Uploaded, Validated,
    Verified,
};

/// Result type for transitions that may need rollback on failure.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

/// Delete `dir` recursively and recreate it empty.
pub(crate) async fn reset_directory<T: RemoteTransport + ?Sized>(
    transport: &T,
    dir: &RemotePath,
) -> crate::transport::Result<()> {
    transport.delete_directory(dir, true).await?;
    transport.create_directory(dir).await
}

/// Move each entry from under `from_root` to the same relative path under
/// `to_root`, recording every committed move.
///
/// Stops at the first failure; the ledger then holds exactly the moves that
/// were committed.
async fn move_entries<T: RemoteTransport + ?Sized>(
    transport: &T,
    entries: Vec<RemoteEntry>,
    from_root: &RemotePath,
    to_root: &RemotePath,
    ledger: &mut MoveLedger,
) -> Result<(), DeployError> {
    let phase = ledger.phase();
    for entry in entries {
        let target = entry.path.rebase(from_root, to_root).ok_or_else(|| {
            DeployError::Transport {
                phase,
                source: crate::transport::TransportError::InvalidListing(entry.path.to_string()),
            }
        })?;

        transport
            .move_entry(&entry.path, &target)
            .await
            .map_err(|source| DeployError::MoveFailed {
                phase,
                from: entry.path.clone(),
                to: target.clone(),
                source,
            })?;

        tracing::debug!(phase = %phase, from = %entry.path, to = %target, "moved entry");
        ledger.record(MoveRecord {
            is_directory: entry.is_directory(),
            from: entry.path,
            to: target,
        });
    }
    Ok(())
}

// =============================================================================
// Initialized -> SlotsReady
// =============================================================================

impl Deployment<Initialized> {
    /// Create the base, staging and backup directories if absent.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Transport` if a directory cannot be checked or created.
    #[must_use = "deployment state must be used"]
    pub async fn ensure_slots<T: RemoteTransport + ?Sized>(
        self,
        transport: &T,
    ) -> Result<Deployment<SlotsReady>, DeployError> {
        let phase = Phase::EnsureSlots;
        let layout = &self.plan.layout;
        tracing::info!(phase = %phase, root = %layout.base(), "ensuring slot directories");

        for dir in [layout.base(), layout.staging(), layout.backup()] {
            let exists = transport
                .directory_exists(dir)
                .await
                .map_err(DeployError::transport(phase))?;
            if !exists {
                transport
                    .create_directory(dir)
                    .await
                    .map_err(DeployError::transport(phase))?;
                tracing::debug!(phase = %phase, path = %dir, "created directory");
            }
        }

        Ok(self.transition(SlotsReady))
    }
}

// =============================================================================
// SlotsReady -> StagingCleared
// =============================================================================

impl Deployment<SlotsReady> {
    /// Empty the staging slot.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Transport` if staging cannot be cleared.
    #[must_use = "deployment state must be used"]
    pub async fn clean_staging<T: RemoteTransport + ?Sized>(
        self,
        transport: &T,
    ) -> Result<Deployment<StagingCleared>, DeployError> {
        let phase = Phase::CleanStaging;
        let staging = self.plan.layout.staging();
        tracing::info!(phase = %phase, path = %staging, "clearing staging");

        let exists = transport
            .directory_exists(staging)
            .await
            .map_err(DeployError::transport(phase))?;
        if exists {
            reset_directory(transport, staging)
                .await
                .map_err(DeployError::transport(phase))?;
        } else {
            transport
                .create_directory(staging)
                .await
                .map_err(DeployError::transport(phase))?;
        }

        Ok(self.transition(StagingCleared))
    }
}

// =============================================================================
// StagingCleared -> Uploaded
// =============================================================================

impl Deployment<StagingCleared> {
    /// Upload the local artifact tree into staging.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::SourceNotFound` if the artifact directory is
    /// missing, or `DeployError::Transport` if any file fails to upload.
    #[must_use = "deployment state must be used"]
    pub async fn upload<T: RemoteTransport + ?Sized>(
        mut self,
        transport: &T,
    ) -> Result<Deployment<Uploaded>, DeployError> {
        let phase = Phase::Upload;
        if !self.plan.source.is_dir() {
            return Err(DeployError::SourceNotFound(self.plan.source.clone()));
        }

        tracing::info!(
            phase = %phase,
            source = %self.plan.source.display(),
            parallelism = self.plan.parallelism,
            "uploading to staging"
        );

        let report = |p: &TransferProgress| {
            tracing::info!(
                phase = %Phase::Upload,
                percent = p.percent,
                path = %p.local.display(),
                "upload progress"
            );
        };
        let options = TreeTransfer::default()
            .parallelism(self.plan.parallelism)
            .progress(&report);

        let summary = transport
            .upload_directory(&self.plan.source, self.plan.layout.staging(), &options)
            .await
            .map_err(DeployError::transport(phase))?;

        self.uploaded = summary;
        Ok(self.transition(Uploaded))
    }
}

// =============================================================================
// Uploaded -> Validated
// =============================================================================

impl Deployment<Uploaded> {
    /// Confirm staging holds at least one file.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::EmptyStaging` when no file is present. Production
    /// has not been touched at this point.
    #[must_use = "deployment state must be used"]
    pub async fn validate<T: RemoteTransport + ?Sized>(
        self,
        transport: &T,
    ) -> Result<Deployment<Validated>, DeployError> {
        let phase = Phase::Validate;
        let staging = self.plan.layout.staging();
        let entries = transport
            .list(staging)
            .await
            .map_err(DeployError::transport(phase))?;

        if !entries.iter().any(RemoteEntry::is_file) {
            return Err(DeployError::EmptyStaging(staging.clone()));
        }

        tracing::info!(phase = %phase, items = entries.len(), "staging validated");
        Ok(self.transition(Validated))
    }
}

// =============================================================================
// Validated -> BackedUp
// =============================================================================

impl Deployment<Validated> {
    /// Move current production content into the backup slot.
    ///
    /// On the first failed move the committed moves are reversed and the
    /// original error is returned.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Transport` if backup cannot be prepared or base
    /// cannot be listed, or `DeployError::MoveFailed` for a failed move.
    #[must_use = "deployment state must be used"]
    pub async fn backup_production<T: RemoteTransport + ?Sized>(
        self,
        transport: &T,
        diagnostics: &mut Diagnostics,
    ) -> Result<Deployment<BackedUp>, DeployError> {
        let phase = Phase::Backup;
        let layout = &self.plan.layout;
        tracing::info!(phase = %phase, path = %layout.backup(), "backing up production");

        reset_directory(transport, layout.backup())
            .await
            .map_err(DeployError::transport(phase))?;

        let entries: Vec<RemoteEntry> = transport
            .list(layout.base())
            .await
            .map_err(DeployError::transport(phase))?
            .into_iter()
            .filter(|entry| !layout.is_reserved(&entry.path))
            .collect();

        let mut ledger = MoveLedger::new(phase);
        if let Err(e) =
            move_entries(transport, entries, layout.base(), layout.backup(), &mut ledger).await
        {
            tracing::error!(phase = %phase, error = %e, "backup failed, restoring moved entries");
            ledger.reverse(transport, diagnostics).await;
            return Err(e);
        }

        tracing::info!(phase = %phase, moved = ledger.len(), "production backed up");
        Ok(self.transition(BackedUp { backup: ledger }))
    }
}

// =============================================================================
// BackedUp -> Promoted
// =============================================================================

impl Deployment<BackedUp> {
    /// Move staging content into production.
    ///
    /// On failure the promotion moves are reversed back into staging, then the
    /// backup moves are reversed so the previous release is live again.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Transport` if staging cannot be listed, or
    /// `DeployError::MoveFailed` for a failed move.
    #[must_use = "deployment state must be used"]
    pub async fn promote_staging<T: RemoteTransport + ?Sized>(
        self,
        transport: &T,
        diagnostics: &mut Diagnostics,
    ) -> Result<Deployment<Promoted>, DeployError> {
        let phase = Phase::Promote;
        let layout = &self.plan.layout;
        tracing::info!(phase = %phase, "promoting staging to production");

        let listed = transport.list(layout.staging()).await;
        let entries = match listed {
            Ok(entries) => entries,
            Err(source) => {
                self.state.backup.reverse(transport, diagnostics).await;
                return Err(DeployError::Transport { phase, source });
            }
        };

        let mut promoted = MoveLedger::new(phase);
        if let Err(e) =
            move_entries(transport, entries, layout.staging(), layout.base(), &mut promoted).await
        {
            tracing::error!(phase = %phase, error = %e, "promotion failed, restoring previous release");
            promoted.reverse(transport, diagnostics).await;
            self.state.backup.reverse(transport, diagnostics).await;
            return Err(e);
        }

        tracing::info!(phase = %phase, moved = promoted.len(), "staging promoted");
        let backup = self.state.backup;
        Ok(Deployment {
            plan: self.plan,
            uploaded: self.uploaded,
            state: Promoted { backup, promoted },
        })
    }
}

// =============================================================================
// Promoted -> Verified
// =============================================================================

impl Deployment<Promoted> {
    /// Check that every configured path exists under production.
    ///
    /// A probe that errors counts as a failed check.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` on failure to allow rollback.
    #[must_use = "deployment state must be used"]
    pub async fn health_check<T: RemoteTransport + ?Sized>(
        self,
        transport: &T,
    ) -> TransitionResult<Verified, Promoted> {
        let phase = Phase::HealthCheck;
        let base = self.plan.layout.base().clone();
        let required: Vec<String> = self.plan.health_paths.iter().cloned().collect();

        for relative in required {
            let path = base.join(relative);
            let probe = match transport.file_exists(&path).await {
                Ok(true) => Ok(true),
                Ok(false) => transport.directory_exists(&path).await,
                Err(e) => Err(e),
            };

            match probe {
                Ok(true) => {
                    tracing::info!(phase = %phase, path = %path, exists = true, "health check");
                }
                Ok(false) => {
                    tracing::info!(phase = %phase, path = %path, exists = false, "health check");
                    let reason = "path does not exist".to_string();
                    return Err((self, DeployError::HealthCheckFailed { path, reason }));
                }
                Err(e) => {
                    tracing::warn!(phase = %phase, path = %path, error = %e, "health probe failed");
                    let reason = format!("probe failed: {}", e);
                    return Err((self, DeployError::HealthCheckFailed { path, reason }));
                }
            }
        }

        let Deployment { plan, uploaded, .. } = self;
        Ok(Deployment {
            plan,
            uploaded,
            state: Verified,
        })
    }

    /// Restore the previous release from backup.
    ///
    /// Never fails: every step that goes wrong is logged, recorded in
    /// `diagnostics` and counted in the report.
    pub async fn rollback<T: RemoteTransport + ?Sized>(
        self,
        transport: &T,
        diagnostics: &mut Diagnostics,
    ) -> RollbackReport {
        restore_backup(transport, &self.plan.layout, diagnostics).await
    }
}

// =============================================================================
// Verified -> Completed
// =============================================================================

impl Deployment<Verified> {
    /// Clear staging. The backup slot is kept for manual rollback.
    ///
    /// A cleanup failure is only a warning; the release is already live.
    pub async fn finalize<T: RemoteTransport + ?Sized>(
        self,
        transport: &T,
        diagnostics: &mut Diagnostics,
    ) -> Deployment<Completed> {
        let phase = Phase::Finalize;
        let staging = self.plan.layout.staging();
        tracing::info!(phase = %phase, path = %staging, "clearing staging");

        if let Err(e) = reset_directory(transport, staging).await {
            diagnostics.warn(Warning::staging_cleanup(format!(
                "failed to clear staging {}: {}",
                staging, e
            )));
        }

        self.transition(Completed)
    }
}
