// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create a warning for a committed move that could not be undone.
    pub fn reversal_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ReversalFailed,
            message: message.into(),
        }
    }

    /// Create a warning for a rollback step that failed and was skipped.
    pub fn rollback_item_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RollbackItemFailed,
            message: message.into(),
        }
    }

    /// Create a staging cleanup warning.
    pub fn staging_cleanup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::StagingCleanup,
            message: message.into(),
        }
    }

    /// Create a disconnect warning.
    pub fn disconnect(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Disconnect,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A move could not be reversed; the entry is left where it was moved.
    ReversalFailed,
    /// A rollback step failed; production may be missing entries.
    RollbackItemFailed,
    /// Staging could not be cleared after a successful release.
    StagingCleanup,
    /// Failed to cleanly close the remote session.
    Disconnect,
}
