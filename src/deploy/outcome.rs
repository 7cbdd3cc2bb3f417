// ABOUTME: Deployment phases and the final outcome of a run.
// ABOUTME: Outcomes map to process exit codes.

use serde::Serialize;
use std::fmt;

/// A step of the deployment pipeline, used for logging and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    EnsureSlots,
    CleanStaging,
    Upload,
    Validate,
    Backup,
    Promote,
    HealthCheck,
    Rollback,
    Finalize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::EnsureSlots => "ensure_slots",
            Phase::CleanStaging => "clean_staging",
            Phase::Upload => "upload",
            Phase::Validate => "validate",
            Phase::Backup => "backup",
            Phase::Promote => "promote",
            Phase::HealthCheck => "health_check",
            Phase::Rollback => "rollback",
            Phase::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// How a deployment run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentOutcome {
    /// New release is live and passed health checks.
    Succeeded,
    /// Health checks failed and the previous release was fully restored.
    FailedAndRolledBack,
    /// Health checks failed and at least one rollback step failed.
    FailedRollbackIncomplete,
    /// Interrupted before completion. No rollback was attempted.
    Cancelled,
}

impl DeploymentOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            DeploymentOutcome::Succeeded => 0,
            DeploymentOutcome::FailedAndRolledBack
            | DeploymentOutcome::FailedRollbackIncomplete => 1,
            DeploymentOutcome::Cancelled => 2,
        }
    }

    pub fn is_success(self) -> bool {
        self == DeploymentOutcome::Succeeded
    }
}

impl fmt::Display for DeploymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentOutcome::Succeeded => write!(f, "deployment succeeded"),
            DeploymentOutcome::FailedAndRolledBack => {
                write!(f, "deployment failed; previous release restored")
            }
            DeploymentOutcome::FailedRollbackIncomplete => {
                write!(f, "deployment failed; rollback incomplete")
            }
            DeploymentOutcome::Cancelled => write!(f, "deployment cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(DeploymentOutcome::Succeeded.exit_code(), 0);
        assert_eq!(DeploymentOutcome::FailedAndRolledBack.exit_code(), 1);
        assert_eq!(DeploymentOutcome::FailedRollbackIncomplete.exit_code(), 1);
        assert_eq!(DeploymentOutcome::Cancelled.exit_code(), 2);
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&DeploymentOutcome::FailedAndRolledBack).unwrap();
        assert_eq!(json, "\"failed_and_rolled_back\"");
    }
}
