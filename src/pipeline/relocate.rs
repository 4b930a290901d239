//! Archive folder layout and file relocation.
//!
//! Moves are replace-on-conflict: a file landing on an existing name
//! overwrites it. Callers that need history must rename before routing.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::RelocationError;
use crate::pipeline::types::all_folders;

/// The archive root and the per-class folders under it.
#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
}

impl Archive {
    /// Create an archive rooted at `root`. Nothing is touched on disk
    /// until [`ensure_folders`](Self::ensure_folders) runs.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create every archive folder that does not exist yet. Idempotent:
    /// an already-existing folder is success, not an error.
    pub async fn ensure_folders(&self) -> Result<(), RelocationError> {
        for folder in all_folders() {
            let path = self.root.join(folder);
            fs::create_dir_all(&path)
                .await
                .map_err(|source| RelocationError::CreateFolder {
                    path: path.clone(),
                    source,
                })?;
            debug!(folder = %path.display(), "Archive folder ready");
        }
        Ok(())
    }

    /// Move the file at `file_path` into `<root>/<target_folder>/<file_name>`.
    ///
    /// The source must exist; a missing source fails with
    /// [`RelocationError::SourceMissing`] and touches nothing. On any
    /// failure the source file is left where it was.
    pub async fn move_into(
        &self,
        file_path: &str,
        file_name: &str,
        target_folder: &str,
    ) -> Result<PathBuf, RelocationError> {
        let source = Path::new(file_path);
        match fs::metadata(source).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RelocationError::SourceMissing {
                    path: source.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(RelocationError::Move {
                    from: source.to_path_buf(),
                    to: self.root.join(target_folder).join(file_name),
                    source: e,
                });
            }
        }

        let target_dir = self.root.join(target_folder);
        fs::create_dir_all(&target_dir)
            .await
            .map_err(|source| RelocationError::CreateFolder {
                path: target_dir.clone(),
                source,
            })?;

        let target = target_dir.join(file_name);

        // rename is atomic and overwrites on the same filesystem; fall back
        // to copy + remove for cross-volume moves.
        if let Err(rename_err) = fs::rename(source, &target).await {
            debug!(
                error = %rename_err,
                from = %source.display(),
                "rename failed, falling back to copy + remove"
            );
            fs::copy(source, &target)
                .await
                .map_err(|e| RelocationError::Move {
                    from: source.to_path_buf(),
                    to: target.clone(),
                    source: e,
                })?;
            fs::remove_file(source)
                .await
                .map_err(|e| RelocationError::Move {
                    from: source.to_path_buf(),
                    to: target.clone(),
                    source: e,
                })?;
        }

        info!(
            file = file_name,
            folder = target_folder,
            "File moved into archive"
        );
        Ok(target)
    }
}
