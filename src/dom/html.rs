//! HTML serialization for [`Document`](super::Document) subtrees.

use super::{Document, NodeId};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

/// Serialize `node` including its own tag (`outerHTML`).
pub fn outer_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

/// Serialize only the children of `node` (`innerHTML`).
pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    if let Some(el) = doc.get(node) {
        if let Some(text) = el.text() {
            out.push_str(&escape_text(text));
        }
        for &child in el.children() {
            write_node(doc, child, &mut out);
        }
    }
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    let Some(el) = doc.get(node) else {
        return;
    };

    out.push('<');
    out.push_str(el.tag());

    if let Some(id) = el.id() {
        push_attr(out, "id", id);
    }
    if !el.classes().is_empty() {
        push_attr(out, "class", &el.classes().join(" "));
    }
    for (name, value) in el.attrs() {
        if name != "id" {
            push_attr(out, name, value);
        }
    }
    if !el.style_pairs().is_empty() {
        let css = el
            .style_pairs()
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        push_attr(out, "style", &css);
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&el.tag()) {
        return;
    }

    out.push_str(&inner_html(doc, node));
    out.push_str("</");
    out.push_str(el.tag());
    out.push('>');
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value.
pub fn escape_attr(s: &str) -> String {
    escape_text(s)
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
