use serde::{Deserialize, Serialize};

/// Byte range inside the log text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// How sure the parser is about an event, in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(pub f64);

impl Default for Confidence {
    fn default() -> Self {
        Self(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub span: Span,
    pub confidence: Confidence,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl LogEvent {
    pub(crate) fn new(span: Span, payload: EventPayload) -> Self {
        Self {
            span,
            confidence: Confidence::default(),
            payload,
        }
    }

    pub(crate) fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Confidence(confidence);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum EventPayload {
    /// The engine opened an input file: `(./texput.tex`.
    FileEnter { path: String },
    /// The engine closed the innermost open file: `)`.
    FileExit,
    /// Classic error line: `! Undefined control sequence.`
    ErrorStart { message: String },
    /// `-file-line-error` style error: `./texput.tex:12: Missing $ inserted.`
    FileLineError {
        file: String,
        line: u32,
        message: String,
    },
    /// `l.12 \foo` reference printed below an error.
    ErrorLineRef {
        line: u32,
        source_excerpt: Option<String>,
    },
    /// Any other line belonging to the context of the current error.
    ErrorContextLine { text: String },
    /// `! Emergency stop.` or `!  ==> Fatal error occurred ...`
    EmergencyStop { message: String },
    Warning { message: String },
    Info { message: String },
    /// `Output written on texput.pdf (3 pages, 41210 bytes).`
    OutputWritten { path: String, pages: Option<u32> },
}
