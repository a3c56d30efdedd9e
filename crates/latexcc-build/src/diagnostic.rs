//! Turning a failed pass into something a user can act on.

use crate::compiler::{FailureReason, PassFailure};
use crate::workspace::{ScratchWorkspace, WorkspaceError};
use latexcc_log::LogReport;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lines of log tail kept when the engine failed without a recognizable error.
const TAIL_LINES: usize = 8;

/// A compilation failure, as read from the engine's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    /// Messages of any errors reported after the first one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_errors: Vec<String>,
    pub warnings: usize,
    /// The pass that failed, numbered from 1.
    pub pass: u32,
    /// The log could not be read, so `message` describes that instead.
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Builds a diagnostic from the text of a log.
    pub fn from_log(log: &str, pass: u32) -> Self {
        let report = LogReport::from_log(log);
        let warnings = report.warnings.len();
        let mut errors = report.errors.into_iter();

        match errors.next() {
            Some(first) => Self {
                message: first.message,
                file: first.file,
                line: first.line,
                source_excerpt: first.source_excerpt,
                context: first.context,
                other_errors: errors.map(|e| e.message).collect(),
                warnings,
                pass,
                degraded: false,
                notes: Vec::new(),
            },
            None => Self {
                message: "the engine failed without reporting an error".to_string(),
                file: None,
                line: None,
                source_excerpt: None,
                context: log_tail(log),
                other_errors: Vec::new(),
                warnings,
                pass,
                degraded: false,
                notes: Vec::new(),
            },
        }
    }

    /// A diagnostic for a failed pass whose log could not be read.
    pub fn degraded(error: &WorkspaceError, pass: u32) -> Self {
        Self {
            message: error.to_string(),
            file: None,
            line: None,
            source_excerpt: None,
            context: Vec::new(),
            other_errors: Vec::new(),
            warnings: 0,
            pass,
            degraded: true,
            notes: Vec::new(),
        }
    }

    /// `file:line` when the engine gave a location.
    pub fn location(&self) -> Option<String> {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{file}:{line}")),
            (Some(file), None) => Some(file.clone()),
            (None, Some(line)) => Some(format!("line {line}")),
            (None, None) => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location() {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Reads the workspace's log after `failure` and describes it.
///
/// Always produces a diagnostic: a missing or unreadable log yields a
/// degraded one rather than a second error.
pub fn extract(workspace: &ScratchWorkspace, failure: &PassFailure) -> Diagnostic {
    let mut diagnostic = match workspace.read_log() {
        Ok(log) => Diagnostic::from_log(&log, failure.pass),
        Err(e) => {
            warn!("pass {} failed and left no readable log: {}", failure.pass, e);
            Diagnostic::degraded(&e, failure.pass)
        }
    };
    // An exit status says nothing the log doesn't; anything else is the only
    // trace of what went wrong.
    if !matches!(failure.reason, FailureReason::Exit(_)) {
        diagnostic.notes.push(failure.reason.to_string());
    }
    diagnostic
}

fn log_tail(log: &str) -> Vec<String> {
    let lines: Vec<&str> = log.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(TAIL_LINES);
    lines[start..].iter().map(|l| l.to_string()).collect()
}
