//! Inline-markup-to-plain-text conversion for description cells and paragraphs.
//!
//! Unlike [`DomNode::inner_text`], emphasis, code and list structure survive as light
//! Markdown-ish markers, which the return-type templates rely on (`*Array* of ...`).

use tracing::debug;

use docbind_html::DomNode;

/// Render the children of `node` as prose.
pub fn extract_prose(node: DomNode<'_>) -> String {
    let mut out = String::new();
    write_children(node, &mut out);
    normalize_quotes(&out)
}

fn write_children(node: DomNode<'_>, out: &mut String) {
    for child in node.children() {
        if let Some(text) = child.text() {
            out.push_str(text);
            continue;
        }
        if !child.is_element() {
            continue;
        }

        match child.tag_name() {
            "em" | "i" => wrap(child, "*", out),
            "strong" | "b" => wrap(child, "**", out),
            "code" => wrap(child, "`", out),
            "a" | "p" | "ul" | "ol" | "span" => write_children(child, out),
            "br" => out.push('\n'),
            "li" => {
                out.push_str("\n  - ");
                write_children(child, out);
            }
            "img" => match child.attribute("alt").filter(|alt| !alt.is_empty()) {
                Some(alt) => out.push_str(alt),
                None => {
                    out.push('[');
                    out.push_str(child.attribute("src").unwrap_or_default());
                    out.push(']');
                }
            },
            other => {
                debug!(tag = other, "unhandled inline element kept as markup");
                out.push_str(&child.outer_markup());
            }
        }
    }
}

fn wrap(node: DomNode<'_>, marker: &str, out: &mut String) {
    out.push_str(marker);
    write_children(node, out);
    out.push_str(marker);
}

fn normalize_quotes(text: &str) -> String {
    text.replace(['\u{201c}', '\u{201d}'], "\"")
}
