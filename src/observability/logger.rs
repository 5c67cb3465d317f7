//! Structured JSON logger
//!
//! One line per event: `event` first, `severity` second, remaining fields
//! sorted by key. Writes are synchronous and unbuffered. ERROR and FATAL go
//! to stderr, everything else to stdout.

use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Info,
    /// Recoverable, the operation continues or is retried
    Warn,
    /// The operation failed
    Error,
    /// The process cannot continue
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn uses_stderr(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless JSON line logger
pub struct Logger;

impl Logger {
    /// Log an event, routing by severity
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let line = Self::render(severity, event, fields);
        // Logging never fails an operation
        if severity.uses_stderr() {
            let _ = io::stderr().lock().write_all(line.as_bytes());
        } else {
            let mut out = io::stdout().lock();
            let _ = out.write_all(line.as_bytes());
            let _ = out.flush();
        }
    }

    /// Render one log line, newline included
    pub fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut line = String::with_capacity(128 + fields.len() * 32);

        line.push_str("{\"event\":\"");
        escape_into(&mut line, event);
        line.push_str("\",\"severity\":\"");
        line.push_str(severity.as_str());
        line.push('"');

        let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        for (key, value) in sorted {
            line.push_str(",\"");
            escape_into(&mut line, key);
            line.push_str("\":\"");
            escape_into(&mut line, value);
            line.push('"');
        }

        line.push_str("}\n");
        line
    }

    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
}
