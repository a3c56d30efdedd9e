//! Per-compilation scratch directories.

use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

/// Name the source is written under. `texput` is TeX's default job name, so
/// the engine derives the two names below from it.
pub const SOURCE_FILE: &str = "texput.tex";
pub const ARTIFACT_FILE: &str = "texput.pdf";
pub const LOG_FILE: &str = "texput.log";

const DIR_PREFIX: &str = "latexcc-";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("could not create a scratch directory in {}: {source}", root.display())]
    Allocation {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no output artifact at {}: {source}", path.display())]
    ArtifactMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no compiler log at {}: {source}", path.display())]
    LogMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An exclusively owned, uniquely named directory for one compilation.
///
/// The directory and everything the engine left in it are removed when the
/// workspace is dropped, unless it was [persisted](Self::persist).
#[derive(Debug)]
pub struct ScratchWorkspace {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl ScratchWorkspace {
    /// Creates a fresh directory under the system temp dir.
    pub fn allocate() -> Result<Self, WorkspaceError> {
        Self::allocate_in(&std::env::temp_dir())
    }

    /// Creates a fresh directory under `root`.
    pub fn allocate_in(root: &Path) -> Result<Self, WorkspaceError> {
        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir_in(root)
            .map_err(|source| WorkspaceError::Allocation {
                root: root.to_path_buf(),
                source,
            })?;
        let path = dir.path().to_path_buf();
        debug!("allocated scratch workspace {}", path.display());
        Ok(Self {
            path,
            dir: Some(dir),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_path(&self) -> PathBuf {
        self.path.join(SOURCE_FILE)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.path.join(ARTIFACT_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.path.join(LOG_FILE)
    }

    /// Keeps the directory on disk after the workspace is dropped.
    pub fn persist(&mut self) -> &Path {
        if let Some(dir) = self.dir.take() {
            let _ = dir.keep();
        }
        &self.path
    }

    pub fn is_persistent(&self) -> bool {
        self.dir.is_none()
    }

    pub fn write_source(&self, content: &str) -> Result<(), WorkspaceError> {
        let path = self.source_path();
        fs::write(&path, content).map_err(|source| WorkspaceError::Io { path, source })
    }

    pub fn read_artifact(&self) -> Result<Vec<u8>, WorkspaceError> {
        let path = self.artifact_path();
        fs::read(&path).map_err(|source| WorkspaceError::ArtifactMissing { path, source })
    }

    /// Reads the engine's log. Bytes that are not UTF-8 (older engines write
    /// 8-bit code pages) are replaced rather than rejected.
    pub fn read_log(&self) -> Result<String, WorkspaceError> {
        let path = self.log_path();
        match fs::read(&path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(source) => Err(WorkspaceError::LogMissing { path, source }),
        }
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!(
                    "failed to remove scratch workspace {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}
