//! Parsing `key = value` assignments out of a block body.

use crate::extract::RawBlock;
use crate::mapping::ConfigMapping;
use crate::sanitize::{net_delimiters, structural_char_indices};
use crate::warning::{ConfigWarning, WarningKind};

/// A parsed block body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBlock {
    pub mapping: ConfigMapping,
    /// Lines of nested `name { ... }` sub-blocks, trimmed, in source order.
    /// They are not interpreted, only carried through to the rendered block.
    pub nested: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
}

/// Parse the top-level assignments of a block.
///
/// Values that open more `[` (or `{`) than they close continue on the
/// following lines until balanced; continuation lines are joined with a
/// single space. Problems are reported as warnings and never abort.
pub fn parse_assignments(block: &RawBlock) -> (ConfigMapping, Vec<ConfigWarning>) {
    let parsed = parse_block(block);
    (parsed.mapping, parsed.warnings)
}

/// Like [`parse_assignments`], also keeping the lines of nested sub-blocks.
pub fn parse_block(block: &RawBlock) -> ParsedBlock {
    let mut parser = AssignmentParser::default();
    for (offset, line) in block.lines.iter().enumerate() {
        parser.feed(block.first_line + offset, line.trim());
    }
    parser.finish()
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    /// Inside a nested `name { ... }` sub-block.
    Nested { depth: i64 },
    /// Collecting a multi-line value for `key`.
    Continuation {
        key: String,
        line: usize,
        value: String,
        open: char,
        close: char,
        depth: i64,
    },
}

#[derive(Debug, Default)]
struct AssignmentParser {
    mapping: ConfigMapping,
    nested: Vec<String>,
    warnings: Vec<ConfigWarning>,
    state: State,
}

impl AssignmentParser {
    fn feed(&mut self, line_no: usize, line: &str) {
        if line.is_empty() {
            return;
        }

        self.state = match std::mem::take(&mut self.state) {
            State::Idle => self.start(line_no, line),
            State::Nested { depth } => {
                self.nested.push(line.to_string());
                let depth = depth + net_delimiters(line, '{', '}');
                if depth > 0 {
                    State::Nested { depth }
                } else {
                    State::Idle
                }
            }
            State::Continuation {
                key,
                line: start_line,
                mut value,
                open,
                close,
                mut depth,
            } => {
                value.push(' ');
                value.push_str(line);
                for (_, c) in structural_char_indices(line) {
                    if c == open {
                        depth += 1;
                    } else if c == close {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                }
                if depth == 0 {
                    self.assign(start_line, key, value.trim().to_string());
                    State::Idle
                } else {
                    State::Continuation {
                        key,
                        line: start_line,
                        value,
                        open,
                        close,
                        depth,
                    }
                }
            }
        };
    }

    fn start(&mut self, line_no: usize, line: &str) -> State {
        if opens_sub_block(line) {
            self.nested.push(line.to_string());
            self.warn(
                WarningKind::NestedBlock,
                line_no,
                format!("passing nested block through unparsed: {}", line),
            );
            let depth = net_delimiters(line, '{', '}');
            return if depth > 0 {
                State::Nested { depth }
            } else {
                State::Idle
            };
        }

        let Some((key, value)) = split_assignment(line) else {
            self.warn(
                WarningKind::MalformedAssignment,
                line_no,
                format!("not an assignment: {}", line),
            );
            let depth = net_delimiters(line, '{', '}');
            return if depth > 0 {
                State::Nested { depth }
            } else {
                State::Idle
            };
        };

        for (open, close) in [('[', ']'), ('{', '}')] {
            let depth = net_delimiters(value, open, close);
            if depth > 0 {
                return State::Continuation {
                    key: key.to_string(),
                    line: line_no,
                    value: value.to_string(),
                    open,
                    close,
                    depth,
                };
            }
            if depth < 0 {
                self.warn(
                    WarningKind::MalformedAssignment,
                    line_no,
                    format!("unbalanced '{}' in value of '{}'", close, key),
                );
                return State::Idle;
            }
        }

        self.assign(line_no, key.to_string(), value.to_string());
        State::Idle
    }

    fn assign(&mut self, line_no: usize, key: String, value: String) {
        if let Some(previous) = self.mapping.insert(key.clone(), value) {
            self.warn(
                WarningKind::DuplicateKey,
                line_no,
                format!("'{}' assigned again, replacing {}", key, previous),
            );
        }
    }

    fn warn(&mut self, kind: WarningKind, line_no: usize, message: String) {
        self.warnings
            .push(ConfigWarning::at_line(kind, line_no, message));
    }

    fn finish(mut self) -> ParsedBlock {
        match std::mem::take(&mut self.state) {
            State::Continuation { key, line, close, .. } => {
                self.warn(
                    WarningKind::UnterminatedListValue,
                    line,
                    format!("value of '{}' never reaches its closing '{}'; key dropped", key, close),
                );
            }
            // Close what the source left open so the rendered block stays balanced.
            State::Nested { depth } => {
                for _ in 0..depth {
                    self.nested.push("}".to_string());
                }
            }
            State::Idle => {}
        }
        ParsedBlock {
            mapping: self.mapping,
            nested: self.nested,
            warnings: self.warnings,
        }
    }
}

/// Whether `line` starts a `name {` sub-block rather than an assignment.
fn opens_sub_block(line: &str) -> bool {
    structural_char_indices(line)
        .find(|&(_, c)| c == '{' || c == '=')
        .is_some_and(|(_, c)| c == '{')
}

/// Split at the first `=` into a trimmed, non-empty key and value.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}
