//! # latexcc log parser
//!
//! Streaming parser for TeX engine logs (`texput.log` and friends) that turns
//! the engine's wrapped, parenthesis-nested transcript into typed
//! [`LogEvent`](ir::LogEvent)s, and a [`LogReport`] that folds those events
//! into the errors and warnings a caller actually wants to show.
//!
//! The parser understands:
//!
//! - **Line wrapping**: lines hard-wrapped at [`WRAP_WIDTH`](parser::WRAP_WIDTH)
//!   columns are joined back before classification
//! - **File stack**: `(./file.tex` / `)` pairs, so errors can be attributed
//! - **Errors**: `! message`, `file:line: message`, the `l.<n>` reference and
//!   the context lines around it, and fatal stops
//! - **Warnings**: `LaTeX`/`Package`/`Class` warnings and over/underfull boxes
//!
//! ```
//! use latexcc_log::LogReport;
//!
//! let log = "(./texput.tex\n! Undefined control sequence.\nl.3 \\foo\n";
//! let report = LogReport::from_log(log);
//!
//! let error = report.primary_error().unwrap();
//! assert_eq!(error.message, "Undefined control sequence.");
//! assert_eq!(error.line, Some(3));
//! ```
//!
//! Events can also be consumed incrementally:
//!
//! ```
//! use latexcc_log::LogParser;
//!
//! let mut parser = LogParser::new();
//! let mut events = parser.update("(./texput.tex\nLaTeX Warning: ");
//! events.extend(parser.update("Citation `knuth' undefined.\n"));
//! events.extend(parser.finish());
//! assert_eq!(events.len(), 2);
//! ```

/// Typed event representation.
pub mod ir;
/// Streaming parser.
pub mod parser;
/// Folding events into errors and warnings.
pub mod report;


pub use parser::LogParser;
pub use report::{LogError, LogReport, OutputInfo};

/// Version of the serialized event schema.
pub const SCHEMA_VERSION: &str = "1.1.0";
