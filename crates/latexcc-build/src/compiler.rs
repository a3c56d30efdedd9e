use crate::executor::{CommandExecutor, Invocation};
use crate::options::CompileOptions;
use crate::search_path::{SearchPath, TEXINPUTS};
use crate::workspace::SOURCE_FILE;
use log::{debug, trace};
use std::fmt;
use std::io;
use std::path::Path;
use std::process::ExitStatus;

pub const SHELL_ESCAPE_FLAG: &str = "-shell-escape";
/// Makes the engine exit on the first error instead of prompting for input.
pub const HALT_ON_ERROR_FLAG: &str = "-halt-on-error";

/// A Compiler holds the configuration for running an external TeX engine
/// over a scratch workspace, one or more times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiler {
    engine: String,
    args: Vec<String>,
    search_path: SearchPath,
    passes: u32,
}

/// Why a pass did not complete cleanly.
#[derive(Debug)]
pub enum FailureReason {
    /// The engine ran and exited unsuccessfully.
    Exit(ExitStatus),
    /// The engine could not be started at all.
    Spawn(io::Error),
    /// The child environment could not be built.
    Environment(io::Error),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit(status) => write!(f, "engine exited with {status}"),
            Self::Spawn(e) => write!(f, "could not start the engine: {e}"),
            Self::Environment(e) => write!(f, "could not resolve the search path: {e}"),
        }
    }
}

/// The pass that stopped a compilation, numbered from 1.
#[derive(Debug)]
pub struct PassFailure {
    pub pass: u32,
    pub reason: FailureReason,
}

#[derive(Debug)]
pub enum CompilationOutcome {
    /// Every pass exited cleanly.
    Success { passes: u32 },
    /// The first failing pass. No pass after it was run.
    Failed(PassFailure),
}

impl Compiler {
    pub fn new(engine: &str, search_path: SearchPath) -> Self {
        Self {
            engine: engine.to_string(),
            args: vec![HALT_ON_ERROR_FLAG.to_string(), SOURCE_FILE.to_string()],
            search_path,
            passes: 1,
        }
    }

    /// Builds the compiler for `options`, resolving `texInputs` against the
    /// current directory and the inherited `TEXINPUTS`.
    pub fn from_options(options: &CompileOptions) -> io::Result<Self> {
        let search_path = SearchPath::from_env(&options.tex_inputs)?;
        Ok(Self::new(options.engine(), search_path)
            .with_args(Self::args_for(options))
            .with_passes(options.total_passes()))
    }

    /// `[-shell-escape] -halt-on-error texput.tex`
    pub fn args_for(options: &CompileOptions) -> Vec<String> {
        let mut args = Vec::with_capacity(3);
        if options.shell_escape {
            args.push(SHELL_ESCAPE_FLAG.to_string());
        }
        args.push(HALT_ON_ERROR_FLAG.to_string());
        args.push(SOURCE_FILE.to_string());
        args
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Total number of passes, including the first. Zero is treated as one.
    pub fn with_passes(mut self, passes: u32) -> Self {
        self.passes = passes.max(1);
        self
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn invocation(&self, working_dir: &Path) -> Invocation {
        Invocation {
            program: self.engine.clone(),
            args: self.args.clone(),
            working_dir: working_dir.to_path_buf(),
            env: vec![(TEXINPUTS.to_string(), self.search_path.to_string())],
        }
    }

    /// Runs the engine in `working_dir` once per pass, strictly one after
    /// another, stopping at the first pass that fails.
    ///
    /// Files the engine writes (`.aux`, `.toc`, ...) stay in the directory so
    /// each pass sees what the previous one produced.
    pub fn run(&self, executor: &dyn CommandExecutor, working_dir: &Path) -> CompilationOutcome {
        let invocation = self.invocation(working_dir);
        debug!("TEXINPUTS={}", self.search_path);

        for pass in 1..=self.passes {
            debug!("pass {}/{}: {}", pass, self.passes, invocation);
            let reason = match executor.execute(&invocation) {
                Ok(output) => {
                    trace!("stdout:\n{}", String::from_utf8_lossy(&output.stdout));
                    trace!("stderr:\n{}", String::from_utf8_lossy(&output.stderr));
                    if output.status.success() {
                        continue;
                    }
                    FailureReason::Exit(output.status)
                }
                Err(e) => FailureReason::Spawn(e),
            };
            debug!("pass {} failed: {}", pass, reason);
            return CompilationOutcome::Failed(PassFailure { pass, reason });
        }

        CompilationOutcome::Success {
            passes: self.passes,
        }
    }
}
