//! The append-only diagnostics sink.
//!
//! Nothing in this crate panics or raises an exception in response to a
//! script-level error (see the evaluator's failure model). Instead every
//! fallible operation records a [`Diagnostic`] here and substitutes
//! [`crate::value::Value::None`] at the call site. Hosts decide what to do
//! with the accumulated list: print it, fail the run, ignore it.

use std::fmt;
use std::io::{self, Write};

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// One recorded diagnostic: a level, a message, and the source position it
/// was raised at, if any.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.level)?;
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{file}:{line} -- {}", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Append-only collection of [`Diagnostic`]s, shared by the lexer, parser,
/// function indexer, and evaluator for the lifetime of one interpreter run.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, level: Level, message: impl Into<String>, file: Option<&str>, line: Option<u32>) {
        self.entries.push(Diagnostic {
            level,
            message: message.into(),
            file: file.map(str::to_owned),
            line,
        });
    }

    pub fn info(&mut self, message: impl Into<String>, file: &str, line: u32) {
        self.push(Level::Info, message, Some(file), Some(line));
    }

    pub fn warn(&mut self, message: impl Into<String>, file: &str, line: u32) {
        self.push(Level::Warning, message, Some(file), Some(line));
    }

    pub fn error(&mut self, message: impl Into<String>, file: &str, line: u32) {
        self.push(Level::Error, message, Some(file), Some(line));
    }

    /// Records an error with no known source position, e.g. a host-side
    /// failure that occurred before any file was registered.
    pub fn error_untagged(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message, None, None);
    }

    pub fn has_error(&self) -> bool {
        self.entries.iter().any(|d| d.level == Level::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Writes the `--- DIAGNOSTICS REPORT ---` header followed by one line
    /// per entry. Writes nothing at all when there are no entries.
    pub fn flush_to(&self, mut out: impl Write) -> io::Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        writeln!(out, "--- DIAGNOSTICS REPORT ---")?;
        for entry in &self.entries {
            writeln!(out, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sink_has_no_error_and_flushes_nothing() {
        let diag = Diagnostics::new();
        assert!(!diag.has_error());
        let mut buf = Vec::new();
        diag.flush_to(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn error_sets_has_error_and_formats_with_position() {
        let mut diag = Diagnostics::new();
        diag.info("starting up", "main.mt", 1);
        assert!(!diag.has_error());
        diag.error("unknown name 'x'", "main.mt", 4);
        assert!(diag.has_error());

        let mut buf = Vec::new();
        diag.flush_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("--- DIAGNOSTICS REPORT ---\n"));
        assert!(text.contains("[INFO] main.mt:1 -- starting up"));
        assert!(text.contains("[ERROR] main.mt:4 -- unknown name 'x'"));
    }

    #[test]
    fn untagged_error_has_no_position() {
        let mut diag = Diagnostics::new();
        diag.error_untagged("could not read project directory");
        let mut buf = Vec::new();
        diag.flush_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("[ERROR] could not read project directory"));
    }
}
