//! Error type shared by the tokenizer, parser and evaluator.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while parsing or evaluating a strex
/// expression.
///
/// Parse errors carry the file name and line they were found on.  Evaluation
/// errors are per-record: a bad `split()` index in one record is reported to
/// the caller rather than taking the whole program down.
#[derive(Debug, Error)]
pub enum StrexError {
    #[error("{message} line {line} of {file}")]
    Parse {
        message: String,
        file: String,
        line: usize,
    },

    #[error("can't read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{function}: index {index} out of range, only {count} fields")]
    IndexOutOfRange {
        function: &'static str,
        index: i64,
        count: usize,
    },

    #[error("separator parameter to {function} must be a single character, not '{separator}'")]
    BadSeparator {
        function: &'static str,
        separator: String,
    },

    #[error("{0}")]
    Aborted(String),
}

impl StrexError {
    pub(crate) fn parse(message: impl Into<String>, file: &str, line: usize) -> Self {
        StrexError::Parse {
            message: message.into(),
            file: file.to_owned(),
            line,
        }
    }

    /// True for errors raised while building the tree rather than running it.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, StrexError::Parse { .. } | StrexError::Io { .. })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
