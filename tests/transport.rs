// ABOUTME: Integration tests for the remote transport, tree transfers, and the session pool.
// ABOUTME: Exercises MemoryTransport through the public RemoteTransport API.

mod support;

use slotswap::deploy::{self, Deployment, DeploymentOutcome};
use slotswap::diagnostics::Diagnostics;
use slotswap::pool::{PooledTransport, TransportPool};
use slotswap::transport::{
    Fault, MemoryTransport, Operation, RemoteExists, RemoteTransport, SyncMode,
    TransferProgress, TransportError, TreeTransfer,
};
use slotswap::types::RemotePath;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use support::{artifact, live_site, plan, read};
use tokio_util::sync::CancellationToken;

mod connection {
    use super::*;

    #[tokio::test]
    async fn repeated_connects_open_one_session() {
        let transport = MemoryTransport::new();
        for _ in 0..3 {
            transport.connect().await.unwrap();
        }
        assert_eq!(transport.connects(), 1);
    }

    #[tokio::test]
    async fn operations_connect_on_demand() {
        let transport = MemoryTransport::new();
        assert!(transport.directory_exists(&RemotePath::root()).await.unwrap());
        assert!(transport.is_connected());
    }
}

mod tree_transfer {
    use super::*;

    #[tokio::test]
    async fn upload_then_download_preserves_tree() {
        let transport = MemoryTransport::new();
        let source = artifact(&["index.html", "css/site.css", "js/vendor/lib.js"]);
        let remote = RemotePath::new("/site/staging");

        let uploaded = transport
            .upload_directory(source.path(), &remote, &TreeTransfer::default())
            .await
            .unwrap();
        assert_eq!(uploaded.transferred, 3);

        let target = tempfile::tempdir().unwrap();
        let downloaded = transport
            .download_directory(&remote, target.path(), &TreeTransfer::default())
            .await
            .unwrap();
        assert_eq!(downloaded.transferred, 3);
        let lib = std::fs::read_to_string(target.path().join("js/vendor/lib.js")).unwrap();
        assert_eq!(lib, "v2 js/vendor/lib.js");
    }

    #[tokio::test]
    async fn mirror_removes_stale_remote_files() {
        let transport = live_site(&["stale.html"]);
        let source = artifact(&["index.html"]);
        let options = TreeTransfer::default().sync(SyncMode::Mirror);

        transport
            .upload_directory(source.path(), &RemotePath::new("/site"), &options)
            .await
            .unwrap();

        assert!(!transport.exists("/site/stale.html"));
        assert!(transport.exists("/site/index.html"));
    }

    #[tokio::test]
    async fn skip_policy_keeps_existing_files() {
        let transport = live_site(&["index.html"]);
        let source = artifact(&["index.html", "app.js"]);
        let options = TreeTransfer::default().remote_exists(RemoteExists::Skip);

        let summary = transport
            .upload_directory(source.path(), &RemotePath::new("/site"), &options)
            .await
            .unwrap();

        assert_eq!((summary.transferred, summary.skipped), (1, 1));
        assert_eq!(read(&transport, "/site/index.html").as_deref(), Some("v1 index.html"));
    }

    #[tokio::test]
    async fn progress_reaches_one_hundred_percent() {
        let transport = MemoryTransport::new();
        let source = artifact(&["a", "b", "c", "d"]);
        let seen = parking_lot::Mutex::new(Vec::new());
        let report = |p: &TransferProgress| seen.lock().push(p.completed);
        let options = TreeTransfer::default().parallelism(2).progress(&report);

        transport
            .upload_directory(source.path(), &RemotePath::new("/out"), &options)
            .await
            .unwrap();

        let mut completed = seen.into_inner();
        completed.sort_unstable();
        assert_eq!(completed, vec![1, 2, 3, 4]);
    }
}

mod batch_transfer {
    use super::*;

    const FILES: [&str; 3] = ["a.txt", "b.txt", "c.txt"];

    fn local_files(dir: &tempfile::TempDir) -> Vec<PathBuf> {
        FILES.iter().map(|name| dir.path().join(name)).collect()
    }

    #[tokio::test]
    async fn upload_many_places_files_by_name() {
        let transport = MemoryTransport::new();
        let source = artifact(&FILES);
        let seen = parking_lot::Mutex::new(Vec::new());
        let report = |p: &TransferProgress| seen.lock().push((p.remote.clone(), p.completed));

        let summary = transport
            .upload_many(&local_files(&source), &RemotePath::new("/drop"), 2, Some(&report))
            .await
            .unwrap();

        assert_eq!(summary.transferred, 3);
        for name in FILES {
            let expected = format!("v2 {name}");
            assert_eq!(read(&transport, &format!("/drop/{name}")), Some(expected));
        }

        let mut seen = seen.into_inner();
        seen.sort_by_key(|(_, completed)| *completed);
        assert_eq!(seen.iter().map(|(_, c)| *c).collect::<Vec<_>>(), vec![1, 2, 3]);
        let mut remotes: Vec<_> = seen.into_iter().map(|(remote, _)| remote).collect();
        remotes.sort();
        let expected: Vec<_> = FILES
            .iter()
            .map(|name| RemotePath::new(format!("/drop/{name}")))
            .collect();
        assert_eq!(remotes, expected);
    }

    #[tokio::test]
    async fn download_many_writes_each_pair() {
        let transport = live_site(&FILES);
        let target = tempfile::tempdir().unwrap();
        let pairs: Vec<_> = FILES
            .iter()
            .map(|name| {
                (
                    RemotePath::new(format!("/site/{name}")),
                    target.path().join("copies").join(name),
                )
            })
            .collect();

        let summary = transport.download_many(&pairs, 2).await.unwrap();

        assert_eq!(summary.transferred, 3);
        for name in FILES {
            let copied = std::fs::read_to_string(target.path().join("copies").join(name)).unwrap();
            assert_eq!(copied, format!("v1 {name}"));
        }
    }

    #[tokio::test]
    async fn failed_item_reports_first_error_after_the_rest_finish() {
        let transport = MemoryTransport::new();
        transport.inject(Fault::on(Operation::Upload).at("/drop/b.txt"));
        transport.inject(Fault::on(Operation::Upload).at("/drop/c.txt"));
        let source = artifact(&["a.txt", "b.txt", "c.txt", "d.txt"]);
        let locals: Vec<_> = ["a.txt", "b.txt", "c.txt", "d.txt"]
            .iter()
            .map(|name| source.path().join(name))
            .collect();

        let err = transport
            .upload_many(&locals, &RemotePath::new("/drop"), 2, None)
            .await
            .unwrap_err();

        assert!(
            matches!(&err, TransportError::Remote { path, .. } if path.as_str() == "/drop/b.txt"),
            "unexpected error: {err:?}"
        );
        assert!(transport.exists("/drop/a.txt"));
        assert!(transport.exists("/drop/d.txt"));
        assert!(!transport.exists("/drop/b.txt"));
        assert!(!transport.exists("/drop/c.txt"));
    }
}

mod moves {
    use super::*;

    #[tokio::test]
    async fn move_never_replaces_an_existing_entry() {
        let transport = live_site(&["index.html", "backup/index.html"]);
        let from = RemotePath::new("/site/backup/index.html");
        let to = RemotePath::new("/site/index.html");

        let err = transport.move_entry(&from, &to).await.unwrap_err();

        assert!(matches!(&err, TransportError::AlreadyExists(p) if *p == to));
        assert_eq!(read(&transport, "/site/index.html").as_deref(), Some("v1 index.html"));
        assert_eq!(
            read(&transport, "/site/backup/index.html").as_deref(),
            Some("v1 backup/index.html")
        );
        assert!(transport.moves().is_empty());
    }
}

mod pool {
    use super::*;

    #[tokio::test]
    async fn concurrent_leases_never_exceed_capacity() {
        let pool = Arc::new(TransportPool::new(2, MemoryTransport::new));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let lease = pool.acquire().await.unwrap();
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    lease.connect().await.unwrap();
                    tokio::task::yield_now().await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(pool.created() <= 2);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn deployment_runs_through_pooled_session() {
        let pool = Arc::new(TransportPool::new(1, || live_site(&["index.html"])));
        let source = artifact(&["index.html", "app.js"]);

        {
            let pooled = PooledTransport::new(Arc::clone(&pool));
            let mut diag = Diagnostics::default();
            let outcome = deploy::run(
                Deployment::new(plan(&source)),
                &pooled,
                &CancellationToken::new(),
                &mut diag,
            )
            .await
            .unwrap();
            assert_eq!(outcome, DeploymentOutcome::Succeeded);
            assert!(pooled.release());
        }

        // Capacity one, so the same session comes back.
        let lease = pool.acquire().await.unwrap();
        assert_eq!(pool.created(), 1);
        assert_eq!(read(&lease, "/site/index.html").as_deref(), Some("v2 index.html"));
        assert_eq!(read(&lease, "/site/backup/index.html").as_deref(), Some("v1 index.html"));
    }
}
