// ABOUTME: Init command implementation.
// ABOUTME: Writes a commented slotswap.yml template into the working directory.

use slotswap::config::{self, CONFIG_FILENAME};
use slotswap::error::Result;
use slotswap::output::Output;
use std::env;

pub fn init(host: Option<&str>, root: Option<&str>, force: bool, output: Output) -> Result<()> {
    let cwd = env::current_dir()?;
    config::init_config(&cwd, host, root, force)?;
    output.success(&format!("Created {}", cwd.join(CONFIG_FILENAME).display()));
    Ok(())
}
