//! Rendering the final configuration text.

use crate::mapping::ConfigMapping;

/// Render a mapping as a `<block_name> { ... }` block.
pub fn render_block(block_name: &str, mapping: &ConfigMapping) -> String {
    render_block_with(block_name, mapping, &[] as &[&str])
}

/// Render a block: the assignments first, then any nested sub-block lines
/// as they were written.
pub fn render_block_with<S: AsRef<str>>(
    block_name: &str,
    mapping: &ConfigMapping,
    nested: &[S],
) -> String {
    let mut out = format!("{} {{\n", block_name);
    for (key, value) in mapping.iter() {
        out.push_str(&format!("   {} = {}\n", key, value));
    }
    for line in nested {
        out.push_str(&format!("   {}\n", line.as_ref()));
    }
    out.push_str("}\n");
    out
}

/// Reassemble a full config: preamble, the rendered block, then the
/// remainder, all passed through unmodified.
pub fn render_config<S: AsRef<str>>(
    preamble: &[S],
    block_name: &str,
    mapping: &ConfigMapping,
    remainder: &[S],
) -> String {
    render_document(preamble, &render_block(block_name, mapping), remainder)
}

pub(crate) fn render_document<S: AsRef<str>>(preamble: &[S], block: &str, remainder: &[S]) -> String {
    let mut out = String::new();
    for line in preamble {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out.push_str(block);
    let remainder: Vec<&str> = remainder.iter().map(|l| l.as_ref()).collect();
    out.push_str(&remainder.join("\n"));
    out
}
