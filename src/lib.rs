// ABOUTME: Library root for slotswap - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod artifact;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod pool;
pub mod retry;
pub mod ssh;
pub mod transport;
pub mod types;
