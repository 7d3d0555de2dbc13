//! XML parts to and from the arena tree.
//!
//! Parsing keeps every byte that matters for a faithful round trip:
//! whitespace, declarations, comments and processing instructions. Entity
//! references are resolved manually since quick-xml reports them as
//! separate events.

use quick_xml::Reader;
use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::{BytesStart, Event};

use super::arena::{Attribute, Dom, NodeData, NodeId};
use crate::error::Result;

/// Parse an XML document into a tree.
pub fn parse_xml(content: &str) -> Result<Dom> {
    let mut reader = Reader::from_str(content);
    // Whitespace inside text runs is content.
    reader.config_mut().trim_text(false);

    let mut dom = Dom::new();
    let mut stack = vec![dom.document()];

    loop {
        let top = stack.last().copied().unwrap_or_else(|| dom.document());
        match reader.read_event()? {
            Event::Start(e) => {
                let el = element_from(&mut dom, &e);
                dom.append(top, el);
                stack.push(el);
            }
            Event::Empty(e) => {
                let el = element_from(&mut dom, &e);
                dom.append(top, el);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(e.as_ref());
                if !text.is_empty() {
                    dom.append_text(top, &text);
                }
            }
            Event::GeneralRef(e) => {
                let name = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&name) {
                    Some(resolved) => dom.append_text(top, &resolved),
                    None => dom.append_text(top, &format!("&{name};")),
                }
            }
            Event::CData(e) => {
                dom.append_text(top, &String::from_utf8_lossy(e.as_ref()));
            }
            Event::Decl(e) => {
                let raw = dom.create_raw(format!("<?{}?>", String::from_utf8_lossy(&e)));
                dom.append(top, raw);
            }
            Event::PI(e) => {
                let raw = dom.create_raw(format!("<?{}?>", String::from_utf8_lossy(&e)));
                dom.append(top, raw);
            }
            Event::Comment(e) => {
                let raw = dom.create_raw(format!("<!--{}-->", String::from_utf8_lossy(e.as_ref())));
                dom.append(top, raw);
            }
            Event::DocType(e) => {
                let raw = dom.create_raw(format!(
                    "<!DOCTYPE {}>",
                    String::from_utf8_lossy(e.as_ref())
                ));
                dom.append(top, raw);
            }
            Event::Eof => break,
        }
    }

    dom.mark_clean();
    Ok(dom)
}

fn element_from(dom: &mut Dom, e: &BytesStart) -> NodeId {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let attrs = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = unescape(&raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            Attribute::new(key, value)
        })
        .collect();
    dom.create_element(name, attrs)
}

/// Resolve the predefined XML entities and character references.
fn resolve_entity(name: &str) -> Option<String> {
    let predefined = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    };
    if let Some(c) = predefined {
        return Some(c.to_string());
    }

    let num = name.strip_prefix('#')?;
    let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => num.parse().ok()?,
    };
    char::from_u32(code).map(|c| c.to_string())
}

/// Serialize a tree back to XML text.
pub fn write_xml(dom: &Dom) -> String {
    let mut out = String::with_capacity(dom.len() * 16);
    for child in dom.children(dom.document()) {
        write_node(dom, child, &mut out);
    }
    out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
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
                out.push_str(&escape(attr.value.as_str()));
                out.push('"');
            }
            if node.first_child.is_none() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in dom.children(id) {
                write_node(dom, child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text(text) => out.push_str(&partial_escape(text.as_str())),
        NodeData::Raw(raw) => out.push_str(raw),
        NodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, out);
            }
        }
    }
}
