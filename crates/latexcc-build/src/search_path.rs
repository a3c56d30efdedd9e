//! Construction of the `TEXINPUTS` value handed to the engine.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Environment variable the engine reads its input search path from.
pub const TEXINPUTS: &str = "TEXINPUTS";

/// Separator between search path segments.
pub const SEPARATOR: char = ':';

/// A fully resolved `TEXINPUTS` value for one compilation.
///
/// Caller-supplied directories come first, followed by every segment of the
/// inherited value exactly as it was. An unset or empty inherited value
/// contributes a single empty segment, which leaves a trailing separator so
/// the engine still falls back to its built-in search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath(String);

impl SearchPath {
    /// Resolves `base_paths` against `cwd` and prepends them to `inherited`.
    pub fn resolve_from<P: AsRef<Path>>(cwd: &Path, base_paths: &[P], inherited: &str) -> Self {
        let resolved = base_paths
            .iter()
            .map(|path| absolutize(cwd, path.as_ref()).to_string_lossy().into_owned());
        let inherited = inherited.split(SEPARATOR).map(str::to_owned);
        let segments: Vec<String> = resolved.chain(inherited).collect();
        Self(segments.join(&SEPARATOR.to_string()))
    }

    /// Like [`resolve_from`](Self::resolve_from) using the process's current
    /// directory.
    pub fn resolve<P: AsRef<Path>>(base_paths: &[P], inherited: &str) -> io::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::resolve_from(&cwd, base_paths, inherited))
    }

    /// Resolves against the current directory and the process's own
    /// `TEXINPUTS`, which is read but never modified.
    pub fn from_env<P: AsRef<Path>>(base_paths: &[P]) -> io::Result<Self> {
        let inherited = std::env::var_os(TEXINPUTS)
            .map(|value| value.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::resolve(base_paths, &inherited)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }
}

impl fmt::Display for SearchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute paths are returned untouched; relative ones are joined onto
/// `cwd` and lexically normalized (`.` dropped, `..` applied).
fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let mut out = PathBuf::new();
    for component in cwd.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
