// ABOUTME: Blue-green deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Deployment struct, the run driver, rollback and slot status.

mod deployment;
mod error;
mod ledger;
mod outcome;
mod rollback;
mod runner;
mod state;
mod status;
mod transitions;

pub use deployment::{DEFAULT_HEALTH_PATH, DeployPlan, Deployment};
pub use error::{DeployError, DeployErrorKind};
pub use ledger::{MoveLedger, MoveRecord, ReversalReport};
pub use outcome::{DeploymentOutcome, Phase};
pub use rollback::{RollbackReport, ensure_backup, restore_backup};
pub use runner::run;
pub use state::{
    BackedUp, Completed, Initialized, Promoted, SlotsReady, StagingCleared, Uploaded, Validated,
    Verified,
};
pub use status::{SlotStatus, inspect_slots};
pub use transitions::TransitionResult;
