//! Per-run temporary directory.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// A temporary directory owned by exactly one pipeline run.
///
/// [`Workspace::cleanup`] removes it recursively. If a run is dropped before
/// cleanup (e.g. its task was aborted) the directory is removed on drop.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    cleaned: bool,
}

impl Workspace {
    /// Creates `<temp_root>/uplink-<run_id>`.
    pub async fn create(temp_root: &Path, run_id: Uuid) -> std::io::Result<Self> {
        let root = temp_root.join(format!("uplink-{}", run_id));
        tokio::fs::create_dir_all(&root).await?;
        debug!(path = %root.display(), "Created workspace");
        Ok(Self {
            root,
            cleaned: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of `file_name` inside the workspace.
    pub fn file(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn is_cleaned(&self) -> bool {
        self.cleaned
    }

    /// Removes the directory and everything in it. Best-effort and idempotent.
    pub async fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;

        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => debug!(path = %self.root.display(), "Removed workspace"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.root.display(), error = %e, "Failed to remove workspace")
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.cleaned {
            if let Err(e) = std::fs::remove_dir_all(&self.root) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.root.display(), error = %e, "Failed to remove workspace on drop");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_cleanup() {
        let temp = tempfile::tempdir().unwrap();
        let run_id = Uuid::new_v4();

        let mut ws = Workspace::create(temp.path(), run_id).await.unwrap();
        assert!(ws.path().is_dir());
        assert!(ws.path().ends_with(format!("uplink-{}", run_id)));

        tokio::fs::create_dir_all(ws.file("nested")).await.unwrap();
        tokio::fs::write(ws.file("nested").join("a.bin"), b"x").await.unwrap();
        tokio::fs::write(ws.file("b.bin"), b"y").await.unwrap();

        ws.cleanup().await;
        assert!(ws.is_cleaned());
        assert!(!ws.path().exists());

        // second call is a no-op
        ws.cleanup().await;
    }

    #[tokio::test]
    async fn test_drop_removes_directory() {
        let temp = tempfile::tempdir().unwrap();
        let path = {
            let ws = Workspace::create(temp.path(), Uuid::new_v4()).await.unwrap();
            tokio::fs::write(ws.file("left.bin"), b"z").await.unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_cleanup_tolerates_missing_directory() {
        let temp = tempfile::tempdir().unwrap();
        let mut ws = Workspace::create(temp.path(), Uuid::new_v4()).await.unwrap();
        std::fs::remove_dir_all(ws.path()).unwrap();
        ws.cleanup().await;
        assert!(ws.is_cleaned());
    }
}
