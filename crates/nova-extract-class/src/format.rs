//! Indentation helpers for splicing member text into the new class body.

/// Body indent of the synthesized class.
pub(crate) const INDENT: &str = "    ";

/// Moves a member cut out of the original file to the new class's body indent.
///
/// `text` starts mid-line at the member's first token; `first_line_indent` is
/// the whitespace that preceded it on that line.
pub(crate) fn reindent_member(text: &str, first_line_indent: &str) -> String {
    let block = format!("{first_line_indent}{text}");
    indent_block(&dedent_block(&block), INDENT)
}

/// Prefixes every non-blank line of `block` with `indent`. Blank lines are
/// emitted empty.
pub(crate) fn indent_block(block: &str, indent: &str) -> String {
    let mut out = String::with_capacity(block.len() + indent.len() * 4);
    for (idx, line) in block.lines().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        if !line.trim().is_empty() {
            out.push_str(indent);
            out.push_str(line.trim_end());
        }
    }
    out
}

/// Removes the common leading indentation of all non-blank lines.
pub(crate) fn dedent_block(block: &str) -> String {
    let lines: Vec<&str> = block.lines().collect();
    let min_indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_width(line))
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(block.len());
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        if !line.trim().is_empty() {
            out.push_str(&line[min_indent..]);
        }
    }
    out
}

/// Byte length of the leading spaces and tabs of `line`.
///
/// Other Unicode whitespace counts as content, so slicing at the common
/// width always lands on a char boundary.
fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}
