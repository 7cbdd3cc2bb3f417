// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use slotswap::output::OutputMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slotswap")]
#[command(about = "Blue-green static artifact deployment over SSH")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON events instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file to use instead of discovering slotswap.yml
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "slotswap=debug"
        } else if self.quiet || self.json {
            "slotswap=warn"
        } else {
            "slotswap=info"
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new slotswap.yml configuration file
    Init {
        /// Server address written to the template ([user@]host[:port])
        #[arg(long)]
        host: Option<String>,

        /// Deployment root on the server
        #[arg(long)]
        root: Option<String>,

        /// Overwrite an existing slotswap.yml
        #[arg(short, long)]
        force: bool,
    },

    /// Upload an artifact directory and swap it into production
    Deploy {
        /// Local directory to deploy (defaults to config `source`, then dist/build/public)
        source: Option<PathBuf>,

        #[command(flatten)]
        target: Target,
    },

    /// Restore the previous release from the backup slot
    Rollback {
        #[command(flatten)]
        target: Target,
    },

    /// Show entry counts for production, staging and backup
    Status {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args)]
pub struct Target {
    /// Target destination (defined in config)
    #[arg(short, long)]
    pub destination: Option<String>,
}
