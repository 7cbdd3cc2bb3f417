// ABOUTME: Rollback command implementation.
// ABOUTME: Moves the retained backup release back into production.

use super::remote::Remote;
use slotswap::config::Config;
use slotswap::deploy::{DeploymentOutcome, ensure_backup, restore_backup};
use slotswap::diagnostics::Diagnostics;
use slotswap::error::Result;
use slotswap::output::Output;
use slotswap::transport::RemoteTransport;
use slotswap::types::SlotLayout;
use tokio_util::sync::CancellationToken;

/// Restore the backup slot into production.
pub async fn rollback(
    config: Config,
    cancel: CancellationToken,
    mut output: Output,
) -> Result<DeploymentOutcome> {
    output.start_timer();
    let layout = config.layout()?;

    output.progress(&format!(
        "Rolling back {}:{}",
        config.server.host, config.root
    ));

    let remote = Remote::open(&config)?;
    let mut diag = Diagnostics::default();

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::warn!("rollback cancelled");
            Ok(DeploymentOutcome::Cancelled)
        }
        result = restore(remote.transport(), &layout, &output, &mut diag) => result,
    };
    remote.close(&mut diag).await;

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let outcome = result?;
    match outcome {
        DeploymentOutcome::Succeeded => output.success("Rollback complete!"),
        DeploymentOutcome::Cancelled => output.error("rollback cancelled"),
        _ => output.error("rollback was incomplete; production may be missing files"),
    }
    Ok(outcome)
}

async fn restore<T: RemoteTransport + ?Sized>(
    transport: &T,
    layout: &SlotLayout,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<DeploymentOutcome> {
    let entries = ensure_backup(transport, layout).await?;
    output.progress(&format!(
        "  → Restoring {} entries from {}...",
        entries,
        layout.backup()
    ));

    let report = restore_backup(transport, layout, diag).await;
    if report.is_complete() {
        Ok(DeploymentOutcome::Succeeded)
    } else {
        Ok(DeploymentOutcome::FailedRollbackIncomplete)
    }
}
