// ABOUTME: Compile-fail test verifying staging cannot be promoted before upload and backup.
// ABOUTME: This test should fail to compile, validating state machine safety.

use slotswap::deploy::{Deployment, Initialized};
use slotswap::diagnostics::Diagnostics;
use slotswap::transport::RemoteTransport;

async fn try_invalid_promote<T: RemoteTransport>(
    deployment: Deployment<Initialized>,
    transport: &T,
) {
    let mut diagnostics = Diagnostics::default();
    // ERROR: promote_staging() method doesn't exist on Deployment<Initialized>
    let _ = deployment.promote_staging(transport, &mut diagnostics).await;
}

fn main() {}
