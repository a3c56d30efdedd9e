use crate::LogParser;
use crate::ir::{EventPayload, LogEvent, Span};
use serde::{Deserialize, Serialize};

/// One error reported by the engine, with whatever location it gave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogError {
    pub message: String,
    /// Innermost open file when the error was raised, or the file named by a
    /// `file:line:` prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// The offending source text from the `l.<n>` reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    pub span: Span,
}

impl LogError {
    fn new(message: String, file: Option<String>, line: Option<u32>, span: Span) -> Self {
        Self {
            message,
            file,
            line,
            source_excerpt: None,
            context: Vec::new(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputInfo {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

/// Errors and warnings folded out of a log's event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogReport {
    pub errors: Vec<LogError>,
    pub warnings: Vec<String>,
    /// Set when the engine gave up (`Emergency stop`, `Fatal error occurred`).
    pub fatal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputInfo>,
}

impl LogReport {
    /// Parses `log` and folds the resulting events.
    pub fn from_log(log: &str) -> Self {
        Self::from_events(&LogParser::new().parse(log))
    }

    pub fn from_events(events: &[LogEvent]) -> Self {
        let mut report = Self::default();
        let mut files: Vec<&str> = Vec::new();
        let mut open: Option<LogError> = None;
        let mut emergency: Option<LogError> = None;

        for event in events {
            match &event.payload {
                EventPayload::FileEnter { path } => files.push(path.as_str()),
                EventPayload::FileExit => {
                    files.pop();
                }
                EventPayload::ErrorStart { message } => {
                    report.errors.extend(open.take());
                    let file = files.last().map(|f| f.to_string());
                    open = Some(LogError::new(message.clone(), file, None, event.span));
                }
                EventPayload::FileLineError {
                    file,
                    line,
                    message,
                } => {
                    report.errors.extend(open.take());
                    open = Some(LogError::new(
                        message.clone(),
                        Some(file.clone()),
                        Some(*line),
                        event.span,
                    ));
                }
                EventPayload::ErrorLineRef {
                    line,
                    source_excerpt,
                } => {
                    if let Some(error) = open.as_mut().or(emergency.as_mut()) {
                        error.line.get_or_insert(*line);
                        error.source_excerpt = source_excerpt.clone();
                    }
                }
                EventPayload::ErrorContextLine { text } => {
                    if let Some(error) = open.as_mut().or(emergency.as_mut()) {
                        error.context.push(text.clone());
                    }
                }
                EventPayload::EmergencyStop { message } => {
                    report.errors.extend(open.take());
                    report.fatal = true;
                    if emergency.is_none() {
                        let file = files.last().map(|f| f.to_string());
                        emergency = Some(LogError::new(message.clone(), file, None, event.span));
                    }
                }
                EventPayload::Warning { message } => report.warnings.push(message.clone()),
                EventPayload::OutputWritten { path, pages } => {
                    report.output = Some(OutputInfo {
                        path: path.clone(),
                        pages: *pages,
                    });
                }
                EventPayload::Info { .. } => {}
            }
        }
        report.errors.extend(open);

        // An emergency stop on its own (e.g. a missing `\end{document}`) is the
        // only thing left to report.
        if report.errors.is_empty() {
            report.errors.extend(emergency);
        }
        report
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The error that stopped the run: the first one the engine reported.
    pub fn primary_error(&self) -> Option<&LogError> {
        self.errors.first()
    }
}
