//! Locating a named top-level block inside free-form config text.

use crate::sanitize::{QuoteState, net_delimiters, sanitize_line, structural_char_indices};
use crate::warning::{ConfigWarning, WarningKind};
use crate::{ConfigError, ConfigResult};

/// Sanitized body of the extracted block, opening brace consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBlock {
    /// Body lines. The first one is whatever followed the opening brace.
    pub lines: Vec<String>,
    /// 1-indexed source line of `lines[0]`.
    pub first_line: usize,
}

/// Result of splitting a config file around its block.
#[derive(Debug, Clone, Default)]
pub struct ExtractedBlock {
    pub block: RawBlock,
    /// Raw lines before the block header.
    pub preamble: Vec<String>,
    /// Raw lines after the block's closing brace.
    pub remainder: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
}

/// Find the first top-level `<block_name> {` and split the input around it.
///
/// The header may be spread over lines (`k8s` then `{`). Braces inside
/// quotes or line comments are ignored when counting nesting, both for the
/// lines before the block and for the block body.
pub fn extract_block<S: AsRef<str>>(lines: &[S], block_name: &str) -> ConfigResult<ExtractedBlock> {
    let mut outer_depth: i64 = 0;
    let mut pending = String::new();
    let mut pending_start = 0;

    for (idx, raw) in lines.iter().enumerate() {
        let (clean, _) = sanitize_line(raw.as_ref(), QuoteState::None);

        if outer_depth == 0 {
            let candidate = format!("{}{}", pending, clean);
            let header = match header_brace(&candidate, block_name) {
                Some(brace) if !pending.is_empty() => Some((pending_start, brace - pending.len())),
                Some(brace) => Some((idx, brace)),
                None if !pending.is_empty() => header_brace(&clean, block_name).map(|b| (idx, b)),
                None => None,
            };
            if let Some((header_start, brace)) = header {
                tracing::debug!(block = block_name, line = idx + 1, "found config block");
                return Ok(collect_body(lines, header_start, idx, brace + 1));
            }
            if candidate.trim() == block_name {
                if pending.is_empty() {
                    pending_start = idx;
                }
                pending = candidate;
                continue;
            }
            if clean.trim() == block_name {
                pending_start = idx;
                pending = clean;
                continue;
            }
            pending.clear();
        }

        outer_depth = (outer_depth + net_delimiters(&clean, '{', '}')).max(0);
    }

    Err(ConfigError::BlockNotFound(block_name.to_string()))
}

/// Byte offset of the opening brace if `text` starts a `<name> {` header.
fn header_brace(text: &str, name: &str) -> Option<usize> {
    let trimmed = text.trim_start();
    let rest = trimmed.strip_prefix(name)?;
    let after_name = rest.trim_start();
    if !after_name.starts_with('{') {
        return None;
    }
    Some(text.len() - after_name.len())
}

/// Accumulate the block body starting right after the opening brace at
/// `offset` on line `header_idx`.
fn collect_body<S: AsRef<str>>(
    lines: &[S],
    header_start: usize,
    header_idx: usize,
    offset: usize,
) -> ExtractedBlock {
    let preamble = lines[..header_start]
        .iter()
        .map(|l| l.as_ref().to_string())
        .collect();

    let mut extracted = ExtractedBlock {
        block: RawBlock {
            lines: Vec::new(),
            first_line: header_idx + 1,
        },
        preamble,
        ..Default::default()
    };

    let mut depth: i64 = 1;
    for (idx, raw) in lines.iter().enumerate().skip(header_idx) {
        let raw = raw.as_ref();
        let start = if idx == header_idx { offset } else { 0 };
        let (clean, _) = sanitize_line(&raw[start..], QuoteState::None);

        match closing_brace(&clean, &mut depth) {
            Some(close) => {
                extracted.block.lines.push(clean[..close].to_string());

                let trailing = &raw[start + close + 1..];
                let mut remainder: Vec<String> =
                    lines[idx + 1..].iter().map(|l| l.as_ref().to_string()).collect();
                if !sanitize_line(trailing, QuoteState::None).0.trim().is_empty() {
                    extracted.warnings.push(ConfigWarning::at_line(
                        WarningKind::TrailingContent,
                        idx + 1,
                        format!("text after closing brace kept outside the block: {}", trailing.trim()),
                    ));
                    remainder.insert(0, trailing.to_string());
                }
                extracted.remainder = remainder;
                return extracted;
            }
            None => extracted.block.lines.push(clean),
        }
    }

    extracted.warnings.push(ConfigWarning::at_line(
        WarningKind::UnterminatedBlock,
        header_idx + 1,
        "block is never closed; reading to end of file",
    ));
    extracted
}

/// Update `depth` over `line`, returning the offset where it drops to zero.
fn closing_brace(line: &str, depth: &mut i64) -> Option<usize> {
    for (i, c) in structural_char_indices(line) {
        match c {
            '{' => *depth += 1,
            '}' => {
                *depth -= 1;
                if *depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
