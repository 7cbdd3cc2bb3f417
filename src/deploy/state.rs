// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: States after backup carry the move ledgers needed to undo their phase.

use super::ledger::MoveLedger;

/// Initial state: plan resolved, nothing touched on the server.
/// Available actions: `ensure_slots()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Base, staging and backup directories exist.
/// Available actions: `clean_staging()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotsReady;

/// Staging is empty.
/// Available actions: `upload()`
#[derive(Debug, Clone, Copy, Default)]
pub struct StagingCleared;

/// Artifact uploaded into staging.
/// Available actions: `validate()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Uploaded;

/// Staging holds at least one file. Production is still untouched.
/// Available actions: `backup_production()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Validated;

/// Previous production moved into backup.
/// Available actions: `promote_staging()`
#[derive(Debug)]
pub struct BackedUp {
    pub(crate) backup: MoveLedger,
}

/// Staging content moved into production.
/// Available actions: `health_check()`, `rollback()`
#[derive(Debug)]
pub struct Promoted {
    pub(crate) backup: MoveLedger,
    pub(crate) promoted: MoveLedger,
}

/// Health checks passed against production.
/// Available actions: `finalize()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Verified;

/// Completed: staging cleared, backup retained for manual rollback.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Completed;
