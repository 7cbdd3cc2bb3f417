// ABOUTME: Locates the local artifact directory to deploy.
// ABOUTME: Explicit path first, then the configured source, then conventional build output dirs.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};

/// Build output directories tried, in order, when no source is configured.
pub const CANDIDATE_DIRS: &[&str] = &["dist", "build", "public"];

/// Pick the directory to upload.
///
/// An explicit path or a configured `source` must exist; otherwise the
/// first existing candidate under `cwd` wins, then `dist` next to the
/// executable.
pub fn resolve_source(explicit: Option<&Path>, config: &Config, cwd: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit {
        let path = if path.is_relative() {
            cwd.join(path)
        } else {
            path.to_path_buf()
        };
        return require_dir(path);
    }

    if let Some(path) = config.source_path() {
        return require_dir(path);
    }

    let mut candidates: Vec<PathBuf> = CANDIDATE_DIRS.iter().map(|dir| cwd.join(dir)).collect();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join("dist"));
    }

    match candidates.iter().find(|path| path.is_dir()) {
        Some(found) => {
            tracing::debug!(path = %found.display(), "using artifact directory");
            Ok(found.clone())
        }
        None => Err(Error::NoSource(candidates)),
    }
}

fn require_dir(path: PathBuf) -> Result<PathBuf> {
    if path.is_dir() {
        Ok(path)
    } else {
        Err(Error::SourceNotFound(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_yaml("server: web1\nroot: /var/www/site\n").unwrap()
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_source(Some(Path::new("missing")), &config(), dir.path()).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(p) if p == dir.path().join("missing")));
    }

    #[test]
    fn configured_source_beats_candidates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("dist")).unwrap();
        std::fs::create_dir(dir.path().join("out")).unwrap();

        let mut config = config();
        config.source = Some(PathBuf::from("out"));
        config.config_dir = Some(dir.path().to_path_buf());

        let found = resolve_source(None, &config, dir.path()).unwrap();
        assert_eq!(found, dir.path().join("out"));
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("build")).unwrap();
        std::fs::create_dir(dir.path().join("public")).unwrap();

        let found = resolve_source(None, &config(), dir.path()).unwrap();
        assert_eq!(found, dir.path().join("build"));
    }

    #[test]
    fn file_is_not_a_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dist"), "not a dir").unwrap();
        let err = resolve_source(Some(Path::new("dist")), &config(), dir.path()).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
    }
}
