//! # latexcc build pipeline
//!
//! Compiles a LaTeX source string into PDF bytes by running an external,
//! non-interactive engine (`pdflatex` by default) inside a throwaway scratch
//! directory.
//!
//! A compilation is a strict sequence:
//!
//! 1. allocate a [`ScratchWorkspace`] and write the source as `texput.tex`;
//! 2. run the engine `1 + compileExtraTimes` times with a freshly resolved
//!    `TEXINPUTS` ([`SearchPath`]), stopping at the first failing pass;
//! 3. return `texput.pdf`, or turn `texput.log` into a [`Diagnostic`].
//!
//! Extra passes exist because LaTeX only settles cross-references and
//! tables of contents after seeing its own `.aux` output from a previous run.
//!
//! The calling process's environment is read but never modified, and every
//! call owns its workspace, so compilations can run concurrently.
//!
//! ```no_run
//! use latexcc_build::{CompileError, CompileOptions, Pipeline};
//!
//! let options = CompileOptions::new()
//!     .with_tex_inputs(["./styles"])
//!     .with_extra_passes(2);
//!
//! match Pipeline::new().compile(r"\documentclass{article}...", &options) {
//!     Ok(doc) => std::fs::write("out.pdf", doc.bytes())?,
//!     Err(CompileError::Compilation(diagnostic)) => eprintln!("{diagnostic}"),
//!     Err(other) => return Err(other.into()),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod artifact;
pub mod compiler;
pub mod diagnostic;
pub mod error;
pub mod executor;
pub mod options;
pub mod pipeline;
pub mod search_path;
pub mod workspace;

pub use artifact::CompiledDocument;
pub use compiler::{CompilationOutcome, Compiler};
pub use diagnostic::Diagnostic;
pub use error::{CompileError, ErrorKind};
pub use executor::{CommandExecutor, Invocation, SystemExecutor};
pub use options::CompileOptions;
pub use pipeline::{Pipeline, compile_document};
pub use search_path::SearchPath;
pub use workspace::{ScratchWorkspace, WorkspaceError};
