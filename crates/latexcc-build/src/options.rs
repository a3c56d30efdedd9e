use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine used when [`CompileOptions::engine`] is not set.
pub const DEFAULT_ENGINE: &str = "pdflatex";

/// Caller-facing knobs for one compilation.
///
/// Field names serialize in camelCase (`texInputs`, `shellEscape`,
/// `compileExtraTimes`, ...) and every field may be omitted.
///
/// ```
/// use latexcc_build::CompileOptions;
///
/// let options: CompileOptions =
///     serde_json::from_str(r#"{ "texInputs": ["./figs"], "compileExtraTimes": -4 }"#).unwrap();
/// assert_eq!(options.extra_passes(), 0);
/// assert_eq!(options.total_passes(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Directories searched before the inherited `TEXINPUTS`, in order.
    /// Relative entries are resolved against the current directory.
    pub tex_inputs: Vec<PathBuf>,
    /// Pass `-shell-escape` to the engine.
    pub shell_escape: bool,
    /// Passes to run after the first one. Absent, `null` and negative values
    /// all mean zero; read it through [`extra_passes`](Self::extra_passes).
    pub compile_extra_times: Option<i64>,
    /// Executable to run instead of [`DEFAULT_ENGINE`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Leave the scratch workspace on disk instead of deleting it.
    pub keep_workspace: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tex_inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.tex_inputs = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_shell_escape(mut self, enabled: bool) -> Self {
        self.shell_escape = enabled;
        self
    }

    pub fn with_extra_passes(mut self, passes: i64) -> Self {
        self.compile_extra_times = Some(passes);
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_keep_workspace(mut self, keep: bool) -> Self {
        self.keep_workspace = keep;
        self
    }

    /// Normalized extra pass count, never negative.
    pub fn extra_passes(&self) -> u32 {
        match self.compile_extra_times {
            // Leaves room for the first pass in a u32 total.
            Some(n) if n > 0 => n.min(i64::from(u32::MAX - 1)) as u32,
            _ => 0,
        }
    }

    /// The mandatory first pass plus [`extra_passes`](Self::extra_passes).
    pub fn total_passes(&self) -> u32 {
        self.extra_passes().saturating_add(1)
    }

    pub fn engine(&self) -> &str {
        self.engine.as_deref().unwrap_or(DEFAULT_ENGINE)
    }
}
