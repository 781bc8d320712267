//! Error types for the loader and the execution engine.
//!
//! Both are surfaced to the CLI as a printed diagnostic followed by a
//! non-zero exit code; neither has a recovery path, so there is no need
//! for anything richer than `Display`.

use std::fmt;

/// Failures while parsing and loading a program image.
#[derive(Debug)]
pub enum LoaderError {
    /// The program file could not be opened or read.
    Io {
        path: String,
        source: std::io::Error,
    },
    /// A non-comment, non-blank line was not exactly 64 `0`/`1` characters.
    BadLine { line: usize, reason: String },
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::Io { path, source } => {
                write!(f, "could not read program file '{path}': {source}")
            }
            LoaderError::BadLine { line, reason } => {
                write!(f, "malformed program at line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for LoaderError {}

/// Fatal conditions raised during instruction execution.
///
/// The only fatal condition in this machine is division by zero;
/// everything else the decoder/execution engine encounters (unmapped
/// registers, unknown instructions, out-of-range addresses) is absorbed
/// silently by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionError {
    DivideByZero,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::DivideByZero => write!(f, "division by zero"),
        }
    }
}

impl std::error::Error for ExecutionError {}
