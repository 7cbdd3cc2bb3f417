// ABOUTME: RemoteTransport over an SSH session using POSIX shell primitives.
// ABOUTME: Connects lazily, retries every remote command and streams file bytes through cat.

use async_trait::async_trait;
use chrono::DateTime;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{
    EntryKind, LocalExists, ProgressFn, RemoteEntry, RemoteExists, RemoteMetadata,
    RemoteTransport, Result, TransferProgress, TransferStatus, TransportError,
};
use crate::retry::RetryPolicy;
use crate::ssh::{CommandOutput, Session, SessionConfig, shell_quote};
use crate::types::RemotePath;

/// Transport backed by one lazily opened SSH session.
///
/// Each command runs on its own channel, so concurrent transfers share the
/// session. A session that drops is replaced on the next call.
pub struct SshTransport {
    config: SessionConfig,
    retry: RetryPolicy,
    session: Mutex<Option<Arc<Session>>>,
}

impl std::fmt::Debug for SshTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshTransport")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("retry", &self.retry)
            .finish()
    }
}

impl SshTransport {
    pub fn new(config: SessionConfig, retry: RetryPolicy) -> Self {
        Self {
            config,
            retry,
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    async fn session(&self) -> Result<Arc<Session>> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref()
            && !session.is_closed()
        {
            return Ok(Arc::clone(session));
        }

        let session = Arc::new(Session::connect(self.config.clone()).await?);
        *guard = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Run `command` through the retry policy, failing on a non-zero exit.
    async fn run(
        &self,
        operation: &'static str,
        path: &RemotePath,
        command: &str,
    ) -> Result<CommandOutput> {
        self.retry
            .execute(operation, move || async move {
                let output = self.session().await?.exec(command).await?;
                if output.success() {
                    Ok(output)
                } else {
                    Err(command_failure(operation, path, &output))
                }
            })
            .await
    }

    /// Run a `test` style probe: exit 0 is true, exit 1 is false.
    async fn probe(&self, operation: &'static str, path: &RemotePath, flag: &str) -> Result<bool> {
        let command = format!("test {} {}", flag, shell_quote(path.as_str()));
        let command = command.as_str();
        self.retry
            .execute(operation, move || async move {
                let output = self.session().await?.exec(command).await?;
                match output.exit_code {
                    0 => Ok(true),
                    1 => Ok(false),
                    _ => Err(command_failure(operation, path, &output)),
                }
            })
            .await
    }
}

fn command_failure(
    operation: &'static str,
    path: &RemotePath,
    output: &CommandOutput,
) -> TransportError {
    let stderr = output.stderr.trim();
    if stderr.contains("No such file or directory") {
        return TransportError::NotFound(path.clone());
    }
    let message = if stderr.is_empty() {
        format!("exit code {}", output.exit_code)
    } else {
        stderr.to_string()
    };
    TransportError::Remote {
        operation,
        path: path.clone(),
        message,
    }
}

const DESTINATION_EXISTS: &str = "File exists";

/// `mv -T` replaces an existing file or empty directory, so the destination
/// is checked first and an occupied one is refused.
fn move_command(from: &RemotePath, to: &RemotePath) -> String {
    let (from, to) = (shell_quote(from.as_str()), shell_quote(to.as_str()));
    format!(
        "if [ ! -e {from} ] && [ ! -L {from} ]; then echo {from}': No such file or directory' >&2; exit 1; fi; \
         if [ -e {to} ] || [ -L {to} ]; then echo {to}': {DESTINATION_EXISTS}' >&2; exit 1; fi; \
         mv -T {from} {to}"
    )
}

fn move_failure(from: &RemotePath, to: &RemotePath, output: &CommandOutput) -> TransportError {
    if output.stderr.contains(DESTINATION_EXISTS) {
        return TransportError::AlreadyExists(to.clone());
    }
    command_failure("move_entry", from, output)
}

fn parse_metadata(stdout: &str) -> RemoteMetadata {
    let mut fields = stdout.split_whitespace();
    let size = fields.next().and_then(|s| s.parse().ok());
    let modified = fields
        .next()
        .and_then(|s| s.parse().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    RemoteMetadata { size, modified }
}

/// Parse `find -printf '%y\t%p\n'` output.
///
/// Only regular files and directories are reported.
fn parse_listing(stdout: &str) -> Result<Vec<RemoteEntry>> {
    let mut entries = Vec::new();
    for line in stdout.lines().filter(|l| !l.is_empty()) {
        let (kind, path) = line
            .split_once('\t')
            .ok_or_else(|| TransportError::InvalidListing(line.to_string()))?;
        let kind = match kind {
            "f" => EntryKind::File,
            "d" => EntryKind::Directory,
            other => {
                tracing::debug!(kind = other, path, "skipping special entry");
                continue;
            }
        };
        entries.push(RemoteEntry {
            path: RemotePath::new(path),
            kind,
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

#[async_trait]
impl RemoteTransport for SshTransport {
    async fn connect(&self) -> Result<()> {
        self.retry
            .execute("connect", move || async move { self.session().await.map(|_| ()) })
            .await
    }

    async fn disconnect(&self) -> Result<()> {
        let session = self.session.lock().await.take();
        if let Some(session) = session
            && !session.is_closed()
        {
            session.disconnect().await?;
            tracing::debug!(host = %self.config.host, "ssh session closed");
        }
        Ok(())
    }

    async fn file_exists(&self, path: &RemotePath) -> Result<bool> {
        self.probe("file_exists", path, "-f").await
    }

    async fn directory_exists(&self, path: &RemotePath) -> Result<bool> {
        self.probe("directory_exists", path, "-d").await
    }

    async fn metadata(&self, path: &RemotePath) -> Result<RemoteMetadata> {
        let command = format!("stat -c '%s %Y' {}", shell_quote(path.as_str()));
        let output = self.run("metadata", path, &command).await?;
        Ok(parse_metadata(&output.stdout_text()))
    }

    async fn list(&self, path: &RemotePath) -> Result<Vec<RemoteEntry>> {
        let command = format!(
            "find {} -mindepth 1 -maxdepth 1 -printf '%y\\t%p\\n'",
            shell_quote(path.as_str())
        );
        let output = self.run("list", path, &command).await?;
        parse_listing(&output.stdout_text())
    }

    async fn create_directory(&self, path: &RemotePath) -> Result<()> {
        let command = format!("mkdir -p {}", shell_quote(path.as_str()));
        self.run("create_directory", path, &command).await?;
        Ok(())
    }

    async fn delete_directory(&self, path: &RemotePath, recursive: bool) -> Result<()> {
        let quoted = shell_quote(path.as_str());
        let command = if recursive {
            format!("rm -rf {}", quoted)
        } else {
            format!("if [ -d {0} ]; then rmdir {0}; fi", quoted)
        };
        self.run("delete_directory", path, &command).await?;
        Ok(())
    }

    async fn delete_file(&self, path: &RemotePath) -> Result<()> {
        let command = format!("rm -f {}", shell_quote(path.as_str()));
        self.run("delete_file", path, &command).await?;
        Ok(())
    }

    async fn upload_file(
        &self,
        local: &Path,
        remote: &RemotePath,
        exists: RemoteExists,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<TransferStatus> {
        if exists != RemoteExists::Overwrite && self.file_exists(remote).await? {
            match exists {
                RemoteExists::Skip => return Ok(TransferStatus::Skipped),
                _ => return Err(TransportError::AlreadyExists(remote.clone())),
            }
        }

        let contents = tokio::fs::read(local)
            .await
            .map_err(|e| TransportError::local(local, e))?;
        let parent = remote.parent().unwrap_or_else(RemotePath::root);
        let command = format!(
            "mkdir -p {} && cat > {}",
            shell_quote(parent.as_str()),
            shell_quote(remote.as_str())
        );
        let (command, contents) = (command.as_str(), contents.as_slice());

        self.retry
            .execute("upload_file", move || async move {
                let output = self
                    .session()
                    .await?
                    .exec_with_input(command, contents)
                    .await?;
                if output.success() {
                    Ok(())
                } else {
                    Err(command_failure("upload_file", remote, &output))
                }
            })
            .await?;

        tracing::debug!(
            local = %local.display(),
            remote = %remote,
            bytes = contents.len(),
            "uploaded file"
        );
        if let Some(report) = progress {
            report(&TransferProgress::new(local.to_path_buf(), remote.clone(), 1, 1));
        }
        Ok(TransferStatus::Transferred)
    }

    async fn download_file(
        &self,
        remote: &RemotePath,
        local: &Path,
        exists: LocalExists,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<TransferStatus> {
        if exists == LocalExists::Skip && local.exists() {
            return Ok(TransferStatus::Skipped);
        }

        let command = format!("cat {}", shell_quote(remote.as_str()));
        let output = self.run("download_file", remote, &command).await?;

        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransportError::local(parent, e))?;
        }
        tokio::fs::write(local, &output.stdout)
            .await
            .map_err(|e| TransportError::local(local, e))?;

        tracing::debug!(
            remote = %remote,
            local = %local.display(),
            bytes = output.stdout.len(),
            "downloaded file"
        );
        if let Some(report) = progress {
            report(&TransferProgress::new(local.to_path_buf(), remote.clone(), 1, 1));
        }
        Ok(TransferStatus::Transferred)
    }

    async fn move_entry(&self, from: &RemotePath, to: &RemotePath) -> Result<()> {
        let command = move_command(from, to);
        let command = command.as_str();
        self.retry
            .execute("move_entry", move || async move {
                let output = self.session().await?.exec(command).await?;
                if output.success() {
                    Ok(())
                } else {
                    Err(move_failure(from, to, &output))
                }
            })
            .await?;
        tracing::debug!(from = %from, to = %to, "moved entry");
        Ok(())
    }
}
