// ABOUTME: Ordered log of committed moves within one deployment phase.
// ABOUTME: Reversal replays the log backwards and keeps going past individual failures.

use crate::diagnostics::{Diagnostics, Warning};
use crate::transport::RemoteTransport;
use crate::types::RemotePath;

use super::outcome::Phase;

/// One committed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: RemotePath,
    pub to: RemotePath,
    pub is_directory: bool,
}

impl MoveRecord {
    fn kind(&self) -> &'static str {
        if self.is_directory { "directory" } else { "file" }
    }
}

/// Result of undoing a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReversalReport {
    pub restored: usize,
    pub failed: usize,
}

impl ReversalReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Moves made by a phase, in commit order.
#[derive(Debug, Clone)]
pub struct MoveLedger {
    phase: Phase,
    records: Vec<MoveRecord>,
}

impl MoveLedger {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            records: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn record(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Move every recorded entry back, newest first.
    ///
    /// Best effort: a failed move is logged and reported through
    /// `diagnostics`, and the remaining records are still reversed.
    pub async fn reverse<T: RemoteTransport + ?Sized>(
        &self,
        transport: &T,
        diagnostics: &mut Diagnostics,
    ) -> ReversalReport {
        let mut report = ReversalReport::default();
        tracing::info!(phase = %self.phase, moves = self.records.len(), "reversing moves");

        for record in self.records.iter().rev() {
            match transport.move_entry(&record.to, &record.from).await {
                Ok(()) => {
                    tracing::debug!(
                        phase = %self.phase,
                        kind = record.kind(),
                        from = %record.to,
                        to = %record.from,
                        "reversed move"
                    );
                    report.restored += 1;
                }
                Err(e) => {
                    tracing::error!(
                        phase = %self.phase,
                        kind = record.kind(),
                        from = %record.to,
                        to = %record.from,
                        error = %e,
                        "failed to reverse move"
                    );
                    diagnostics.warn(Warning::reversal_failed(format!(
                        "could not move {} {} back to {}: {}",
                        record.kind(),
                        record.to,
                        record.from,
                        e
                    )));
                    report.failed += 1;
                }
            }
        }
        report
    }
}
