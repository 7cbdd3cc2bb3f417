// ABOUTME: Compile-fail test verifying rollback cannot be called on Completed.
// ABOUTME: This test should fail to compile, validating state machine safety.

use slotswap::deploy::{Completed, Deployment};
use slotswap::diagnostics::Diagnostics;
use slotswap::transport::RemoteTransport;

async fn try_invalid_rollback<T: RemoteTransport>(
    deployment: Deployment<Completed>,
    transport: &T,
) {
    let mut diagnostics = Diagnostics::default();
    // ERROR: rollback() method doesn't exist on Deployment<Completed>
    deployment.rollback(transport, &mut diagnostics).await;
}

fn main() {}
