// ABOUTME: Throttled batch and tree transfers built on the single-file transport primitives.
// ABOUTME: A semaphore bounds in-flight transfers and every transfer finishes before errors surface.

use futures::future::join_all;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use walkdir::WalkDir;

use super::{
    EntryKind, LocalExists, ProgressFn, RemoteExists, RemoteTransport, Result, SyncMode,
    TransferProgress, TransferStatus, TransferSummary, TransportError, TreeTransfer,
};
use crate::types::RemotePath;

pub const DEFAULT_PARALLELISM: usize = 4;
pub const MAX_PARALLELISM: usize = 64;

/// Bound a requested parallelism to `1..=MAX_PARALLELISM`.
pub fn clamp_parallelism(requested: usize) -> usize {
    requested.clamp(1, MAX_PARALLELISM)
}

/// One file to move between the local disk and the remote host.
struct TransferJob {
    local: PathBuf,
    remote: RemotePath,
}

/// Run `jobs` with at most `parallelism` in flight.
///
/// Every job is awaited even after a failure; the first error in job order
/// is returned once all have finished.
async fn run_jobs<F, Fut>(
    jobs: Vec<TransferJob>,
    parallelism: usize,
    progress: Option<ProgressFn<'_>>,
    run: F,
) -> Result<TransferSummary>
where
    F: Fn(PathBuf, RemotePath) -> Fut,
    Fut: Future<Output = Result<TransferStatus>>,
{
    let total = jobs.len();
    let permits = Semaphore::new(clamp_parallelism(parallelism));
    let completed = AtomicUsize::new(0);

    let tasks = jobs.into_iter().map(|job| {
        let permits = &permits;
        let completed = &completed;
        let run = &run;
        async move {
            let _permit = permits.acquire().await.map_err(|_| TransportError::Closed)?;
            let status = run(job.local.clone(), job.remote.clone()).await?;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(report) = progress {
                report(&TransferProgress::new(job.local, job.remote, done, total));
            }
            Ok(status)
        }
    });

    let mut summary = TransferSummary::default();
    let mut first_error = None;
    for result in join_all(tasks).await {
        match result {
            Ok(status) => summary.record(status),
            Err(e) => {
                tracing::warn!(error = %e, "transfer failed");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}

/// Recursively upload `local` into `remote`.
pub async fn upload_tree<T: RemoteTransport + ?Sized>(
    transport: &T,
    local: &Path,
    remote: &RemotePath,
    options: &TreeTransfer<'_>,
) -> Result<TransferSummary> {
    if !local.is_dir() {
        return Err(TransportError::local(
            local,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    if options.sync == SyncMode::Mirror {
        transport.delete_directory(remote, true).await?;
    }
    transport.create_directory(remote).await?;

    let mut jobs = Vec::new();
    for entry in WalkDir::new(local).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(local)
            .map_err(|_| TransportError::InvalidListing(entry.path().display().to_string()))?;
        let target = remote.join(relative_to_remote(relative));

        if entry.file_type().is_dir() {
            transport.create_directory(&target).await?;
        } else if entry.file_type().is_file() {
            jobs.push(TransferJob {
                local: entry.into_path(),
                remote: target,
            });
        }
    }

    tracing::debug!(
        local = %local.display(),
        remote = %remote,
        files = jobs.len(),
        parallelism = clamp_parallelism(options.parallelism),
        "uploading directory"
    );

    let exists = options.remote_exists;
    run_jobs(jobs, options.parallelism, options.progress, move |local, remote| async move {
        transport.upload_file(&local, &remote, exists, None).await
    })
    .await
}

/// Recursively download `remote` into `local`.
pub async fn download_tree<T: RemoteTransport + ?Sized>(
    transport: &T,
    remote: &RemotePath,
    local: &Path,
    options: &TreeTransfer<'_>,
) -> Result<TransferSummary> {
    if !transport.directory_exists(remote).await? {
        return Err(TransportError::NotFound(remote.clone()));
    }

    if options.sync == SyncMode::Mirror && local.exists() {
        tokio::fs::remove_dir_all(local)
            .await
            .map_err(|e| TransportError::local(local, e))?;
    }
    tokio::fs::create_dir_all(local)
        .await
        .map_err(|e| TransportError::local(local, e))?;

    let mut jobs = Vec::new();
    let mut pending = vec![remote.clone()];
    while let Some(dir) = pending.pop() {
        for entry in transport.list(&dir).await? {
            let relative = entry
                .path
                .strip_prefix(remote)
                .ok_or_else(|| TransportError::InvalidListing(entry.path.to_string()))?;
            let target = local_join(local, &relative);
            match entry.kind {
                EntryKind::Directory => {
                    tokio::fs::create_dir_all(&target)
                        .await
                        .map_err(|e| TransportError::local(&target, e))?;
                    pending.push(entry.path);
                }
                EntryKind::File => jobs.push(TransferJob {
                    local: target,
                    remote: entry.path,
                }),
            }
        }
    }

    let exists = options.local_exists;
    run_jobs(jobs, options.parallelism, options.progress, move |local, remote| async move {
        transport.download_file(&remote, &local, exists, None).await
    })
    .await
}

/// Upload each file in `locals` to `remote_dir/<file name>`.
pub async fn upload_batch<T: RemoteTransport + ?Sized>(
    transport: &T,
    locals: &[PathBuf],
    remote_dir: &RemotePath,
    parallelism: usize,
    progress: Option<ProgressFn<'_>>,
) -> Result<TransferSummary> {
    let mut jobs = Vec::with_capacity(locals.len());
    for local in locals {
        let name = local.file_name().ok_or_else(|| {
            TransportError::local(
                local,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;
        jobs.push(TransferJob {
            local: local.clone(),
            remote: remote_dir.join(name.to_string_lossy()),
        });
    }

    run_jobs(jobs, parallelism, progress, move |local, remote| async move {
        transport
            .upload_file(&local, &remote, RemoteExists::Overwrite, None)
            .await
    })
    .await
}

/// Download each `(remote, local)` pair.
pub async fn download_batch<T: RemoteTransport + ?Sized>(
    transport: &T,
    pairs: &[(RemotePath, PathBuf)],
    parallelism: usize,
) -> Result<TransferSummary> {
    let jobs = pairs
        .iter()
        .map(|(remote, local)| TransferJob {
            local: local.clone(),
            remote: remote.clone(),
        })
        .collect();

    run_jobs(jobs, parallelism, None, move |local, remote| async move {
        transport
            .download_file(&remote, &local, LocalExists::Overwrite, None)
            .await
    })
    .await
}

fn relative_to_remote(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn local_join(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallelism_is_clamped() {
        assert_eq!(clamp_parallelism(0), 1);
        assert_eq!(clamp_parallelism(4), 4);
        assert_eq!(clamp_parallelism(1000), MAX_PARALLELISM);
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let relative = Path::new("assets").join("css").join("site.css");
        assert_eq!(relative_to_remote(&relative), "assets/css/site.css");
    }

    #[test]
    fn local_join_splits_remote_segments() {
        let joined = local_join(Path::new("/tmp/out"), "assets/app.js");
        assert_eq!(joined, Path::new("/tmp/out").join("assets").join("app.js"));
    }

    #[tokio::test]
    async fn run_jobs_awaits_all_and_reports_first_error() {
        let jobs = (0..4)
            .map(|i| TransferJob {
                local: PathBuf::from(format!("f{i}")),
                remote: RemotePath::new(format!("/r/f{i}")),
            })
            .collect();
        let finished = AtomicUsize::new(0);
        let finished_ref = &finished;

        let result = run_jobs(jobs, 2, None, move |local, remote| async move {
            finished_ref.fetch_add(1, Ordering::SeqCst);
            if local == Path::new("f1") || local == Path::new("f3") {
                Err(TransportError::NotFound(remote))
            } else {
                Ok(TransferStatus::Transferred)
            }
        })
        .await;

        assert_eq!(finished.load(Ordering::SeqCst), 4);
        match result {
            Err(TransportError::NotFound(path)) => assert_eq!(path.as_str(), "/r/f1"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_jobs_reports_progress_per_file() {
        let jobs = (0..2)
            .map(|i| TransferJob {
                local: PathBuf::from(format!("f{i}")),
                remote: RemotePath::new(format!("/r/f{i}")),
            })
            .collect();
        let seen = parking_lot::Mutex::new(Vec::new());
        let sink = |p: &TransferProgress| seen.lock().push((p.completed, p.total));

        let summary = run_jobs(jobs, 1, Some(&sink), |_, _| async {
            Ok(TransferStatus::Transferred)
        })
        .await
        .unwrap();

        assert_eq!(summary.transferred, 2);
        assert_eq!(*seen.lock(), vec![(1, 2), (2, 2)]);
    }
}
