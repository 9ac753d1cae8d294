//! Doc-comment rendering.

use std::fmt::Write as _;

/// Column doc comments are wrapped at, indentation and `/// ` included.
pub const WRAP_WIDTH: usize = 80;

/// Render `text` as `///` lines indented by `indent`, word-wrapped at [`WRAP_WIDTH`].
///
/// Line breaks in `text` are kept; blank lines become empty `///` lines. A single word
/// longer than the width gets a line of its own rather than being split.
pub fn doc_comment(text: &str, indent: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let prefix = format!("{indent}/// ");
    let width = WRAP_WIDTH.saturating_sub(prefix.len()).max(1);
    let mut out = String::new();

    for line in text.lines() {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            out.push_str(indent);
            out.push_str("///\n");
            continue;
        }

        let mut current = String::new();
        for word in words {
            if !current.is_empty() && current.len() + 1 + word.len() > width {
                push_line(&mut out, &prefix, &current);
                current.clear();
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        push_line(&mut out, &prefix, &current);
    }

    out
}

/// Doc block for an entry: the description, then the additional notes as a separate
/// paragraph.
pub fn entry_doc(description: &str, notes: &str, indent: &str) -> String {
    let mut out = doc_comment(description, indent);
    if !notes.trim().is_empty() {
        if !out.is_empty() {
            let _ = writeln!(out, "{indent}///");
        }
        out.push_str(&doc_comment(notes, indent));
    }
    out
}

fn push_line(out: &mut String, prefix: &str, line: &str) {
    out.push_str(prefix);
    out.push_str(line);
    out.push('\n');
}
