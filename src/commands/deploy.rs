// ABOUTME: Deploy command implementation.
// ABOUTME: Resolves the artifact, connects, and drives the blue-green run to an outcome.

use super::remote::Remote;
use slotswap::artifact::resolve_source;
use slotswap::config::Config;
use slotswap::deploy::{self, DeployPlan, Deployment, DeploymentOutcome};
use slotswap::diagnostics::Diagnostics;
use slotswap::error::Result;
use slotswap::output::Output;
use std::env;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Deploy the artifact directory to the configured server.
pub async fn deploy(
    config: Config,
    source: Option<PathBuf>,
    cancel: CancellationToken,
    mut output: Output,
) -> Result<DeploymentOutcome> {
    output.start_timer();
    let cwd = env::current_dir()?;
    let source = resolve_source(source.as_deref(), &config, &cwd)?;
    let plan = DeployPlan::new(config.layout()?, source.clone())
        .with_parallelism(config.parallelism)
        .with_health_paths(config.health_check.paths());

    output.progress(&format!(
        "Deploying {} to {}:{}",
        source.display(),
        config.server.host,
        config.root
    ));

    let remote = Remote::open(&config)?;
    output.progress(&format!("  → Connecting to {}...", remote.host()));

    let mut diag = Diagnostics::default();
    let result = deploy::run(Deployment::new(plan), remote.transport(), &cancel, &mut diag).await;
    remote.close(&mut diag).await;

    // Emit collected warnings
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let outcome = result?;
    match outcome {
        DeploymentOutcome::Succeeded => output.success("Deployment complete!"),
        DeploymentOutcome::FailedAndRolledBack => {
            output.error("health check failed; previous release restored")
        }
        DeploymentOutcome::FailedRollbackIncomplete => output.error(
            "health check failed and rollback was incomplete; production may be missing files",
        ),
        DeploymentOutcome::Cancelled => output.error("deployment cancelled"),
    }
    Ok(outcome)
}
