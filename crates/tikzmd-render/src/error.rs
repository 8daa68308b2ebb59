//! Compilation errors.

use std::fmt;

/// What went wrong while compiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// The process could not be started.
    Spawn,
    /// The process exited unsuccessfully.
    ExitStatus,
    /// The process exceeded its timeout and was killed.
    TimedOut,
    /// The process succeeded but did not write its expected output.
    MissingOutput,
    /// Reading or writing cache files failed.
    Io,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spawn => "spawn",
            Self::ExitStatus => "exit status",
            Self::TimedOut => "timed out",
            Self::MissingOutput => "missing output",
            Self::Io => "io",
        })
    }
}

/// Compilation failure with captured diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    /// Captured stderr, or the path of the LaTeX log when nothing was captured.
    pub log: Option<String>,
}

impl CompileError {
    #[must_use]
    pub fn new(kind: CompileErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            log: None,
        }
    }

    #[must_use]
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }

    pub(crate) fn io(context: &str, err: &std::io::Error) -> Self {
        Self::new(CompileErrorKind::Io, format!("{context}: {err}"))
    }
}
