//! HTML documents to and from the arena tree.

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use super::arena::{Dom, NodeData, NodeId};
use super::tree_sink::DomSink;

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Parse an HTML document with the browser error-recovery rules.
pub fn parse_html(content: &str) -> Dom {
    parse_document(DomSink::new(), ParseOpts::default())
        .from_utf8()
        .one(content.as_bytes())
        .into_dom()
}

/// Serialize a tree as HTML.
pub fn write_html(dom: &Dom) -> String {
    let mut out = String::with_capacity(dom.len() * 16);
    for child in dom.children(dom.document()) {
        write_node(dom, child, false, &mut out);
    }
    out
}

fn write_node(dom: &Dom, id: NodeId, raw_text: bool, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Element { name, attrs } => {
            out.push('<');
            out.push_str(name);
            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_into(&attr.value, true, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&name.as_str()) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&name.as_str());
            for child in dom.children(id) {
                write_node(dom, child, raw, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text(text) if raw_text => out.push_str(text),
        NodeData::Text(text) => escape_into(text, false, out),
        NodeData::Raw(raw) => out.push_str(raw),
        NodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, false, out);
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
