//! Non-fatal configuration warnings.

use std::fmt;

/// The kind of problem a warning reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A block line that is not a `key = value` assignment.
    MalformedAssignment,
    /// A nested `name { ... }` sub-block, carried through unparsed.
    NestedBlock,
    /// A multi-line value whose brackets never balanced; the key was dropped.
    UnterminatedListValue,
    /// A key assigned more than once; the last value wins.
    DuplicateKey,
    /// The block never closed before the end of the file.
    UnterminatedBlock,
    /// Text after the block's closing brace, moved to the remainder.
    TrailingContent,
    /// A `-v` argument that is not `<claim>:<mountPath>`.
    InvalidVolumeArg,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WarningKind::MalformedAssignment => "malformed assignment",
            WarningKind::NestedBlock => "nested block",
            WarningKind::UnterminatedListValue => "unterminated list value",
            WarningKind::DuplicateKey => "duplicate key",
            WarningKind::UnterminatedBlock => "unterminated block",
            WarningKind::TrailingContent => "trailing content",
            WarningKind::InvalidVolumeArg => "invalid volume argument",
        };
        f.write_str(name)
    }
}

/// A problem that did not stop the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub kind: WarningKind,
    /// 1-indexed line in the source file, when known.
    pub line: Option<usize>,
    pub message: String,
}

impl ConfigWarning {
    pub fn new(kind: WarningKind, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    pub fn at_line(kind: WarningKind, line: usize, message: impl Into<String>) -> Self {
        Self::new(kind, Some(line), message)
    }

    /// Report the warning through `tracing`.
    pub fn emit(&self) {
        match self.line {
            Some(line) => tracing::warn!(kind = %self.kind, line, "{}", self.message),
            None => tracing::warn!(kind = %self.kind, "{}", self.message),
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}: {}", line, self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}
