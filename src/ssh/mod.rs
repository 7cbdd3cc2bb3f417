// ABOUTME: SSH session plumbing for the remote transport.
// ABOUTME: Supports password, key file and agent authentication with known_hosts verification.

mod client;
mod error;

pub use client::{CommandOutput, Credential, Session, SessionConfig, shell_quote};
pub use error::{Error, Result};
