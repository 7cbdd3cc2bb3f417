// ABOUTME: Status command implementation.
// ABOUTME: Prints what each deployment slot currently holds.

use super::remote::Remote;
use slotswap::config::Config;
use slotswap::deploy::inspect_slots;
use slotswap::diagnostics::Diagnostics;
use slotswap::error::Result;
use slotswap::output::{Output, OutputMode};

pub async fn status(config: Config, output: Output) -> Result<()> {
    let layout = config.layout()?;
    let remote = Remote::open(&config)?;
    output.progress(&format!("  → Connecting to {}...", remote.host()));

    let mut diag = Diagnostics::default();
    let result = inspect_slots(remote.transport(), &layout).await;
    remote.close(&mut diag).await;
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
    let slots = result?;

    if output.mode() == OutputMode::Json {
        if let Ok(json) = serde_json::to_string(&slots) {
            println!("{json}");
        }
        return Ok(());
    }

    println!("Server: {}", config.server.host);
    for slot in &slots {
        if slot.exists {
            println!(
                "{:<8} {:>6} entries  {}",
                slot.slot.to_string(),
                slot.entries,
                slot.path
            );
        } else {
            println!("{:<8} {:>6}          {}", slot.slot.to_string(), "-", slot.path);
        }
    }
    Ok(())
}
