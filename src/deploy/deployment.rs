// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: DeployPlan holds everything a run needs; state types carry phase data.

use nonempty::NonEmpty;
use std::path::{Path, PathBuf};

use crate::transport::{DEFAULT_PARALLELISM, TransferSummary, clamp_parallelism};
use crate::types::SlotLayout;

use super::ledger::MoveLedger;
use super::state::{BackedUp, Initialized, Promoted};

pub const DEFAULT_HEALTH_PATH: &str = "index.html";

/// Inputs for one deployment run.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub layout: SlotLayout,
    pub source: PathBuf,
    pub parallelism: usize,
    /// Paths relative to the deployment root that must exist after promotion.
    pub health_paths: NonEmpty<String>,
}

impl DeployPlan {
    pub fn new(layout: SlotLayout, source: impl Into<PathBuf>) -> Self {
        Self {
            layout,
            source: source.into(),
            parallelism: DEFAULT_PARALLELISM,
            health_paths: NonEmpty::new(DEFAULT_HEALTH_PATH.to_string()),
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = clamp_parallelism(parallelism);
        self
    }

    pub fn with_health_paths(mut self, paths: NonEmpty<String>) -> Self {
        self.health_paths = paths;
        self
    }
}

/// A deployment in progress, parameterized by its current state.
///
/// Transitions consume the deployment, so a step cannot be repeated or
/// skipped. States from `BackedUp` onward own the ledgers needed to undo
/// their moves.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) plan: DeployPlan,
    pub(crate) uploaded: TransferSummary,
    pub(crate) state: S,
}

impl Deployment<Initialized> {
    pub fn new(plan: DeployPlan) -> Self {
        Deployment {
            plan,
            uploaded: TransferSummary::default(),
            state: Initialized,
        }
    }
}

impl<S> Deployment<S> {
    pub fn plan(&self) -> &DeployPlan {
        &self.plan
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.plan.layout
    }

    pub fn source(&self) -> &Path {
        &self.plan.source
    }

    /// Files uploaded into staging (zero before the upload step).
    pub fn uploaded(&self) -> TransferSummary {
        self.uploaded
    }

    pub(crate) fn transition<N>(self, state: N) -> Deployment<N> {
        Deployment {
            plan: self.plan,
            uploaded: self.uploaded,
            state,
        }
    }
}

impl Deployment<BackedUp> {
    pub fn backup_ledger(&self) -> &MoveLedger {
        &self.state.backup
    }
}

impl Deployment<Promoted> {
    pub fn backup_ledger(&self) -> &MoveLedger {
        &self.state.backup
    }

    pub fn promote_ledger(&self) -> &MoveLedger {
        &self.state.promoted
    }
}
