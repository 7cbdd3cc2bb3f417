// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, in-memory remote trees, and local artifact fixtures.

use slotswap::deploy::DeployPlan;
use slotswap::transport::MemoryTransport;
use slotswap::types::{RemotePath, SlotLayout};
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

static TRACING_INIT: Once = Once::new();

pub const ROOT: &str = "/site";

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("slotswap=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub fn layout() -> SlotLayout {
    SlotLayout::with_defaults(RemotePath::new(ROOT))
}

/// A remote root already serving the `v1` release.
#[allow(dead_code)]
pub fn live_site(files: &[&str]) -> MemoryTransport {
    let transport = MemoryTransport::new();
    for name in files {
        transport.put_file(format!("{ROOT}/{name}"), format!("v1 {name}"));
    }
    transport
}

/// A local artifact directory holding the `v2` release.
#[allow(dead_code)]
pub fn artifact(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in files {
        write_file(dir.path(), name, &format!("v2 {name}"));
    }
    dir
}

#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

#[allow(dead_code)]
pub fn plan(source: &TempDir) -> DeployPlan {
    DeployPlan::new(layout(), source.path())
}

/// Contents of a remote file as text.
#[allow(dead_code)]
pub fn read(transport: &MemoryTransport, path: &str) -> Option<String> {
    transport
        .read_file(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
