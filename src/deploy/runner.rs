// ABOUTME: Drives a deployment through every phase in order.
// ABOUTME: Races the run against a cancellation token and rolls back on failed health checks.

use tokio_util::sync::CancellationToken;

use crate::diagnostics::Diagnostics;
use crate::transport::RemoteTransport;

use super::Deployment;
use super::error::DeployError;
use super::outcome::DeploymentOutcome;
use super::state::Initialized;

/// Run a deployment to completion.
///
/// Failures before promotion (and failed backup or promotion moves, which
/// undo themselves) are returned as errors. A failed health check triggers a
/// rollback and is reported through the outcome. Cancellation stops the run
/// at its current step without rolling back.
///
/// # Errors
///
/// Returns the `DeployError` of the first phase that failed before health
/// checking.
pub async fn run<T: RemoteTransport + ?Sized>(
    deployment: Deployment<Initialized>,
    transport: &T,
    cancel: &CancellationToken,
    diagnostics: &mut Diagnostics,
) -> Result<DeploymentOutcome, DeployError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::warn!("deployment cancelled");
            Ok(DeploymentOutcome::Cancelled)
        }
        result = drive(deployment, transport, diagnostics) => result,
    }
}

async fn drive<T: RemoteTransport + ?Sized>(
    deployment: Deployment<Initialized>,
    transport: &T,
    diagnostics: &mut Diagnostics,
) -> Result<DeploymentOutcome, DeployError> {
    let deployment = deployment.ensure_slots(transport).await?;
    let deployment = deployment.clean_staging(transport).await?;
    let deployment = deployment.upload(transport).await?;
    let deployment = deployment.validate(transport).await?;
    let deployment = deployment.backup_production(transport, diagnostics).await?;
    let deployment = deployment.promote_staging(transport, diagnostics).await?;

    match deployment.health_check(transport).await {
        Ok(verified) => {
            let completed = verified.finalize(transport, diagnostics).await;
            tracing::info!(
                uploaded = completed.uploaded().transferred,
                root = %completed.layout().base(),
                "deployment succeeded"
            );
            Ok(DeploymentOutcome::Succeeded)
        }
        Err((promoted, error)) => {
            tracing::error!(
                error = %error,
                promoted = promoted.promote_ledger().len(),
                backed_up = promoted.backup_ledger().len(),
                "health checks failed, rolling back"
            );
            let report = promoted.rollback(transport, diagnostics).await;
            Ok(report.outcome())
        }
    }
}
