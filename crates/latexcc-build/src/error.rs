use crate::diagnostic::Diagnostic;
use crate::workspace::WorkspaceError;
use thiserror::Error;

/// Why [`compile_document`](crate::compile_document) produced no PDF.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The scratch directory could not be created. Nothing ran.
    #[error(transparent)]
    WorkspaceAllocation(WorkspaceError),
    /// The source could not be written into the scratch directory.
    #[error(transparent)]
    WorkspaceIo(WorkspaceError),
    /// A pass failed; this is what its log says about it.
    #[error("compilation failed: {0}")]
    Compilation(Box<Diagnostic>),
    /// Every pass exited cleanly but there is no PDF to return.
    #[error("the engine reported success but produced no artifact: {0}")]
    ArtifactMissing(WorkspaceError),
}

/// Fieldless view of [`CompileError`] for matching on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    WorkspaceAllocation,
    WorkspaceIo,
    Compilation,
    ArtifactMissing,
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WorkspaceAllocation(_) => ErrorKind::WorkspaceAllocation,
            Self::WorkspaceIo(_) => ErrorKind::WorkspaceIo,
            Self::Compilation(_) => ErrorKind::Compilation,
            Self::ArtifactMissing(_) => ErrorKind::ArtifactMissing,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Compilation(diagnostic) => Some(&**diagnostic),
            _ => None,
        }
    }
}
