use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

/// Everything needed to start the engine once: built up front and reused
/// unchanged for every pass of a compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Variables set on top of the inherited environment of the child.
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs an [`Invocation`] to completion.
///
/// Exists so the compile pipeline can be driven without a TeX installation.
pub trait CommandExecutor: Send + Sync + fmt::Debug {
    fn execute(&self, invocation: &Invocation) -> io::Result<Output>;
}

impl<T: CommandExecutor + ?Sized> CommandExecutor for Arc<T> {
    fn execute(&self, invocation: &Invocation) -> io::Result<Output> {
        (**self).execute(invocation)
    }
}

/// Spawns the engine as a child process with `std::process::Command`.
///
/// The child inherits this process's environment plus the invocation's
/// overrides; stdin is closed so an engine that stops to prompt gets EOF
/// instead of hanging, and stdout/stderr are captured.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    fn execute(&self, invocation: &Invocation) -> io::Result<Output> {
        Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
    }
}
