//! The compile pipeline: scratch workspace, engine passes, result.
//!
//! ```text
//! allocate workspace ─► write texput.tex ─► pass 1 ─► ... ─► pass N ─► read texput.pdf
//!        │                    │                └──── first failure ────► read texput.log
//!        ▼                    ▼                                            │
//!  WorkspaceAllocation   WorkspaceIo                               Compilation(Diagnostic)
//! ```
//!
//! The workspace is dropped, and so deleted, on every path out of
//! [`Pipeline::compile`] unless `keepWorkspace` is set.

use crate::artifact::CompiledDocument;
use crate::compiler::{CompilationOutcome, Compiler, FailureReason, PassFailure};
use crate::diagnostic;
use crate::error::CompileError;
use crate::executor::{CommandExecutor, SystemExecutor};
use crate::options::CompileOptions;
use crate::workspace::ScratchWorkspace;
use latexcc_log::LogReport;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(test)]
mod tests;

/// Compiles LaTeX sources with an external engine.
///
/// A `Pipeline` holds no per-compilation state, so one instance can serve
/// concurrent calls; every call gets its own scratch workspace.
#[derive(Debug, Clone)]
pub struct Pipeline {
    executor: Arc<dyn CommandExecutor>,
    scratch_root: Option<PathBuf>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// A pipeline that spawns the real engine under the system temp dir.
    pub fn new() -> Self {
        Self::with_executor(Arc::new(SystemExecutor))
    }

    pub fn with_executor(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            scratch_root: None,
        }
    }

    /// Creates scratch workspaces under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompiledDocument, CompileError> {
        let mut workspace = match &self.scratch_root {
            Some(root) => ScratchWorkspace::allocate_in(root),
            None => ScratchWorkspace::allocate(),
        }
        .map_err(CompileError::WorkspaceAllocation)?;

        if options.keep_workspace {
            let kept = workspace.persist().to_path_buf();
            info!("keeping scratch workspace {}", kept.display());
        }

        workspace
            .write_source(source)
            .map_err(CompileError::WorkspaceIo)?;

        let outcome = match Compiler::from_options(options) {
            Ok(compiler) => {
                info!(
                    "compiling in {} with {} ({} pass(es))",
                    workspace.path().display(),
                    options.engine(),
                    compiler.passes()
                );
                compiler.run(self.executor.as_ref(), workspace.path())
            }
            Err(e) => CompilationOutcome::Failed(PassFailure {
                pass: 1,
                reason: FailureReason::Environment(e),
            }),
        };

        let passes = match outcome {
            CompilationOutcome::Success { passes } => passes,
            CompilationOutcome::Failed(failure) => {
                let diagnostic = diagnostic::extract(&workspace, &failure);
                info!("pass {} failed: {}", failure.pass, diagnostic);
                return Err(CompileError::Compilation(Box::new(diagnostic)));
            }
        };

        let pdf = workspace
            .read_artifact()
            .map_err(CompileError::ArtifactMissing)?;

        let warnings = match workspace.read_log() {
            Ok(log) => LogReport::from_log(&log).warnings,
            Err(e) => {
                warn!("compiled cleanly but the log is unreadable: {}", e);
                Vec::new()
            }
        };

        Ok(CompiledDocument::new(pdf, passes, warnings))
    }
}

/// Compiles `source` to PDF bytes with the system engine.
///
/// ```no_run
/// use latexcc_build::{compile_document, CompileOptions};
///
/// let source = r"\documentclass{article}\begin{document}\tableofcontents\section{A}\end{document}";
/// let options = CompileOptions::new().with_extra_passes(1);
/// let pdf = compile_document(source, &options)?;
/// assert!(pdf.starts_with(b"%PDF"));
/// # Ok::<(), latexcc_build::CompileError>(())
/// ```
pub fn compile_document(source: &str, options: &CompileOptions) -> Result<Vec<u8>, CompileError> {
    Pipeline::new()
        .compile(source, options)
        .map(CompiledDocument::into_bytes)
}
