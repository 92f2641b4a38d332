//! Session-scoped artifact directories.
//!
//! Every session writes under `<root>/<session_id>/` so concurrent sessions
//! never share a path. Cleanup removes just that directory.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::session::SessionId;

pub const VISUALIZATION_FILE: &str = "visualization.svg";

#[derive(Debug, Clone)]
pub struct SessionWorkspace {
    dir: PathBuf,
}

impl SessionWorkspace {
    /// Create (if needed) the directory for `session` under `root`.
    pub fn create(root: &Path, session: &SessionId) -> Result<Self> {
        let dir = root.join(session.as_str());
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating session workspace {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn visualization_path(&self) -> PathBuf {
        self.dir.join(VISUALIZATION_FILE)
    }

    /// Remove the session directory. A directory that is already gone is fine.
    pub fn cleanup(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                debug!(target: "session", dir = %self.dir.display(), "workspace removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(target: "session", dir = %self.dir.display(), error = %e, "workspace cleanup failed");
                Err(e).with_context(|| format!("removing {}", self.dir.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_cleanup_are_scoped_to_session() {
        let root = tempfile::tempdir().unwrap();
        let a = SessionWorkspace::create(root.path(), &SessionId::generate()).unwrap();
        let b = SessionWorkspace::create(root.path(), &SessionId::generate()).unwrap();
        assert_ne!(a.dir(), b.dir());

        fs::write(a.visualization_path(), "<svg/>").unwrap();
        a.cleanup().unwrap();
        assert!(!a.dir().exists());
        assert!(b.dir().exists());

        // second cleanup is a no-op
        a.cleanup().unwrap();
    }
}
