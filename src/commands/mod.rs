// ABOUTME: Command module aggregator for the slotswap CLI.
// ABOUTME: Re-exports the init, deploy, rollback, and status command handlers.

mod deploy;
mod init;
mod remote;
mod rollback;
mod status;

pub use deploy::deploy;
pub use init::init;
pub use rollback::rollback;
pub use status::status;

use slotswap::config::Config;
use slotswap::error::Result;
use std::env;
use std::path::Path;

/// Load the explicit config file or discover one in the working directory,
/// then apply destination overrides.
pub fn load_config(path: Option<&Path>, destination: Option<&str>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::discover(&env::current_dir()?)?,
    };

    match destination {
        Some(dest) => config.for_destination(dest),
        None => Ok(config),
    }
}
