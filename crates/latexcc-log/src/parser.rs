use crate::ir::{EventPayload, LogEvent, Span};

/// Column at which TeX engines hard-wrap log lines (`max_print_line`).
pub const WRAP_WIDTH: usize = 79;

/// Prefixes that always begin a fresh log line, even right after a line that
/// happens to be exactly [`WRAP_WIDTH`] bytes long.
const LINE_STARTERS: &[&str] = &[
    "!",
    "(",
    ")",
    "l.",
    "LaTeX",
    "Package",
    "Class",
    "Overfull",
    "Underfull",
    "Output written",
    "Document Class:",
];

/// Parenthesised words that TeX and latexmk print but which are not files.
const NOT_FILES: &[&str] = &["Info", "preloaded", "TeX", "con", "see", "babel"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorState {
    Idle,
    /// Between an error line and its `l.<n>` reference.
    Context,
    /// Right after `l.<n>`: the next indented line is the rest of the source line.
    Trailer,
}

/// A line as TeX meant it, reassembled from one or more wrapped physical lines.
#[derive(Debug, Default)]
struct LogicalLine {
    text: String,
    /// `(logical index, absolute offset)` for the start of every physical segment.
    segments: Vec<(usize, usize)>,
    end: usize,
}

impl LogicalLine {
    fn push(&mut self, segment: &str, absolute_start: usize) {
        self.segments.push((self.text.len(), absolute_start));
        self.text.push_str(segment);
        self.end = absolute_start + segment.len();
    }

    fn is_open(&self) -> bool {
        !self.segments.is_empty()
    }

    fn span(&self) -> Span {
        let start = self.segments.first().map_or(self.end, |&(_, abs)| abs);
        Span::new(start, self.end)
    }

    /// Maps an index into `text` back to a byte offset in the original log.
    fn offset(&self, index: usize) -> usize {
        self.segments
            .iter()
            .rev()
            .find(|&&(logical, _)| logical <= index)
            .map_or(self.end, |&(logical, abs)| abs + (index - logical))
    }
}

/// A streaming parser for TeX engine logs.
///
/// Input can be fed in arbitrary chunks through [`update`](Self::update); only
/// complete lines are interpreted, and lines that TeX wrapped at
/// [`WRAP_WIDTH`] are joined back together before classification. The parser
/// tracks the stack of open input files so that later consumers can attribute
/// errors to the file they occurred in.
pub struct LogParser {
    buffer: String,
    /// Absolute offset of the first byte still held in `buffer`.
    offset: usize,
    current: LogicalLine,
    file_stack: Vec<String>,
    error_state: ErrorState,
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            offset: 0,
            current: LogicalLine::default(),
            file_stack: Vec::new(),
            error_state: ErrorState::Idle,
        }
    }

    /// Appends `input` and returns the events that became available.
    ///
    /// A trailing partial line, or a wrapped line whose continuation has not
    /// arrived yet, is held back until more input or [`finish`](Self::finish).
    pub fn update(&mut self, input: &str) -> Vec<LogEvent> {
        self.buffer.push_str(input);
        let mut events = Vec::new();
        let Some(last_newline) = self.buffer.rfind('\n') else {
            return events;
        };

        let complete: String = self.buffer.drain(..=last_newline).collect();
        for raw in complete.split_inclusive('\n') {
            let start = self.offset;
            self.offset += raw.len();
            self.push_physical(raw.trim_end_matches(['\n', '\r']), start, &mut events);
        }
        events
    }

    /// Flushes everything still buffered and returns the final events.
    pub fn finish(mut self) -> Vec<LogEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let start = self.offset;
            self.offset += rest.len();
            self.push_physical(rest.trim_end_matches('\r'), start, &mut events);
        }
        if self.current.is_open() {
            self.flush(&mut events);
        }
        events
    }

    /// Parses a complete log in one go.
    pub fn parse(mut self, input: &str) -> Vec<LogEvent> {
        let mut events = self.update(input);
        events.extend(self.finish());
        events
    }

    /// The files the engine had open at the current position, outermost first.
    pub fn file_stack(&self) -> &[String] {
        &self.file_stack
    }

    fn push_physical(&mut self, line: &str, start: usize, events: &mut Vec<LogEvent>) {
        if self.current.is_open() && LINE_STARTERS.iter().any(|p| line.starts_with(*p)) {
            self.flush(events);
        }
        self.current.push(line, start);
        if line.len() != WRAP_WIDTH {
            self.flush(events);
        }
    }

    fn flush(&mut self, events: &mut Vec<LogEvent>) {
        let line = std::mem::take(&mut self.current);
        self.classify(&line, events);
    }

    fn classify(&mut self, line: &LogicalLine, events: &mut Vec<LogEvent>) {
        let text = line.text.as_str();
        let span = line.span();

        match self.error_state {
            ErrorState::Context => {
                if let Some((number, excerpt)) = split_line_ref(text) {
                    events.push(LogEvent::new(
                        span,
                        EventPayload::ErrorLineRef {
                            line: number,
                            source_excerpt: excerpt,
                        },
                    ));
                    self.error_state = ErrorState::Trailer;
                    return;
                }
                if text.trim().is_empty() {
                    self.error_state = ErrorState::Idle;
                    return;
                }
                if !text.starts_with('!') && split_file_line_error(text).is_none() {
                    events.push(LogEvent::new(
                        span,
                        EventPayload::ErrorContextLine {
                            text: text.trim_end().to_string(),
                        },
                    ));
                    return;
                }
            }
            ErrorState::Trailer => {
                self.error_state = ErrorState::Idle;
                if text.starts_with(' ') && !text.trim().is_empty() {
                    events.push(LogEvent::new(
                        span,
                        EventPayload::ErrorContextLine {
                            text: text.trim().to_string(),
                        },
                    ));
                    return;
                }
            }
            ErrorState::Idle => {}
        }

        if let Some(rest) = text.strip_prefix('!') {
            let message = rest.trim().to_string();
            let payload = if is_fatal(&message) {
                EventPayload::EmergencyStop { message }
            } else {
                EventPayload::ErrorStart { message }
            };
            events.push(LogEvent::new(span, payload));
            self.error_state = ErrorState::Context;
            return;
        }

        if let Some((file, number, message)) = split_file_line_error(text) {
            let payload = if is_fatal(message) {
                EventPayload::EmergencyStop {
                    message: message.to_string(),
                }
            } else {
                EventPayload::FileLineError {
                    file: file.to_string(),
                    line: number,
                    message: message.to_string(),
                }
            };
            events.push(LogEvent::new(span, payload));
            self.error_state = ErrorState::Context;
            return;
        }

        if is_warning(text) {
            events.push(LogEvent::new(
                span,
                EventPayload::Warning {
                    message: text.trim().to_string(),
                },
            ));
            return;
        }

        if let Some((path, pages)) = split_output_written(text) {
            events.push(LogEvent::new(
                span,
                EventPayload::OutputWritten {
                    path: path.to_string(),
                    pages,
                },
            ));
            return;
        }

        if text.starts_with("No pages of output.") {
            events.push(LogEvent::new(
                span,
                EventPayload::Info {
                    message: text.trim().to_string(),
                },
            ));
            return;
        }

        self.scan_files(line, events);
    }

    /// Walks a line looking for `(path` and `)` to maintain the file stack.
    fn scan_files(&mut self, line: &LogicalLine, events: &mut Vec<LogEvent>) {
        let text = line.text.as_str();
        let mut index = 0;

        while index < text.len() {
            let Some(c) = text[index..].chars().next() else {
                break;
            };
            match c {
                '(' => {
                    let token_start = index + 1;
                    let (path, token_len) = read_path_token(&text[token_start..]);
                    if looks_like_file(&path) {
                        let end = token_start + token_len;
                        events.push(LogEvent::new(
                            Span::new(line.offset(index), line.offset(end)),
                            EventPayload::FileEnter { path: path.clone() },
                        ));
                        self.file_stack.push(path);
                        index = end;
                        continue;
                    }
                }
                ')' => {
                    let at = line.offset(index);
                    let span = Span::new(at, at + 1);
                    if self.file_stack.pop().is_some() {
                        events.push(LogEvent::new(span, EventPayload::FileExit));
                    } else {
                        events.push(
                            LogEvent::new(
                                span,
                                EventPayload::Info {
                                    message: "Unmatched closing parenthesis".into(),
                                },
                            )
                            .with_confidence(0.5),
                        );
                    }
                }
                _ => {}
            }
            index += c.len_utf8();
        }
    }
}

/// Reads the path following a `(`. Returns the path and the bytes consumed.
fn read_path_token(rest: &str) -> (String, usize) {
    if let Some(quoted) = rest.strip_prefix('"') {
        if let Some(close) = quoted.find('"') {
            return (quoted[..close].to_string(), close + 2);
        }
    }
    let len = rest
        .find(|c: char| c == ')' || c == '(' || c.is_whitespace())
        .unwrap_or(rest.len());
    (rest[..len].to_string(), len)
}

fn looks_like_file(token: &str) -> bool {
    if token.is_empty() || NOT_FILES.contains(&token) {
        return false;
    }
    token.starts_with('/')
        || token.starts_with('\\')
        || token.starts_with('.')
        || token.contains('/')
        || (token.contains('.') && !token.ends_with('.'))
}

fn is_fatal(message: &str) -> bool {
    message.starts_with("Emergency stop") || message.starts_with("==> Fatal error occurred")
}

fn is_warning(line: &str) -> bool {
    if line.starts_with("Overfull \\") || line.starts_with("Underfull \\") {
        return true;
    }
    if line.starts_with("pdfTeX warning") {
        return true;
    }
    let Some((head, _)) = line.split_once(':') else {
        return false;
    };
    (head.starts_with("LaTeX") || head.starts_with("Package") || head.starts_with("Class"))
        && head.ends_with("Warning")
}

/// `l.42 \foo{bar}` -> `(42, Some("\foo{bar}"))`
fn split_line_ref(line: &str) -> Option<(u32, Option<String>)> {
    let rest = line.strip_prefix("l.")?;
    let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let number = rest[..digits].parse().ok()?;
    let excerpt = rest[digits..].trim();
    let excerpt = (!excerpt.is_empty()).then(|| excerpt.to_string());
    Some((number, excerpt))
}

/// `./texput.tex:7: Undefined control sequence.` -> `("./texput.tex", 7, "Undefined control sequence.")`
fn split_file_line_error(line: &str) -> Option<(&str, u32, &str)> {
    for (colon, _) in line.match_indices(':') {
        let file = &line[..colon];
        let rest = &line[colon + 1..];
        let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            continue;
        }
        let Some(message) = rest[digits..].strip_prefix(": ") else {
            continue;
        };
        if !looks_like_file(file) || file.starts_with('(') {
            return None;
        }
        let number = rest[..digits].parse().ok()?;
        return Some((file, number, message.trim()));
    }
    None
}

/// `Output written on texput.pdf (1 page, 1234 bytes).` -> `("texput.pdf", Some(1))`
fn split_output_written(line: &str) -> Option<(&str, Option<u32>)> {
    let rest = line.strip_prefix("Output written on ")?;
    let Some(open) = rest.rfind(" (") else {
        return Some((rest.trim_end_matches('.'), None));
    };
    let stats = &rest[open + 2..];
    let digits = stats.bytes().take_while(|b| b.is_ascii_digit()).count();
    let pages = stats[..digits].parse().ok();
    Some((&rest[..open], pages))
}
