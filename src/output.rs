// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::error::Error as StdError;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => emit_stdout(&JsonEvent::new("success", message, self.duration())),
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("  ⚠ {message}"),
            OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => emit_stderr(&JsonEvent::new("warning", message, None)),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => emit_stderr(&JsonEvent::new("error", message, self.duration())),
        }
    }

    /// Print an error followed by every cause in its source chain.
    pub fn error_chain(&self, error: &(dyn StdError + 'static)) {
        let chain = error_chain(error);
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {}", chain[0]);
                for cause in &chain[1..] {
                    eprintln!("  caused by: {cause}");
                }
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    causes: chain[1..].to_vec(),
                    ..JsonEvent::new("error", &chain[0], self.duration())
                };
                emit_stderr(&event);
            }
        }
    }
}

/// Messages of `error` and its sources, skipping a cause whose text is
/// already part of the message above it.
pub fn error_chain(error: &(dyn StdError + 'static)) -> Vec<String> {
    let mut chain = vec![error.to_string()];
    let mut current = error.source();
    while let Some(cause) = current {
        let message = cause.to_string();
        if chain.last().is_none_or(|prev| !prev.contains(&message)) {
            chain.push(message);
        }
        current = cause.source();
    }
    chain
}

fn emit_stdout(event: &JsonEvent<'_>) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

fn emit_stderr(event: &JsonEvent<'_>) {
    if let Ok(json) = serde_json::to_string(event) {
        eprintln!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    causes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

impl<'a> JsonEvent<'a> {
    fn new(event: &'a str, message: &'a str, duration_secs: Option<f64>) -> Self {
        Self {
            event,
            message,
            causes: Vec::new(),
            duration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{DeployError, Phase};
    use crate::transport::TransportError;
    use crate::types::RemotePath;

    #[test]
    fn chain_lists_every_cause() {
        let error = crate::error::Error::Deploy(DeployError::Transport {
            phase: Phase::Upload,
            source: TransportError::NotFound(RemotePath::new("/site/staging")),
        });
        let chain = error_chain(&error);
        assert_eq!(chain[0], "deployment failed");
        // The transport cause is already part of the deploy error message.
        assert_eq!(chain.len(), 2);
        assert!(chain[1].contains("/site/staging"));
    }

    #[test]
    fn chain_skips_repeated_messages() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer: {0}")]
        struct Outer(#[source] std::io::Error);

        let error = Outer(std::io::Error::other("disk full"));
        assert_eq!(error_chain(&error), vec!["outer: disk full".to_string()]);
    }
}
