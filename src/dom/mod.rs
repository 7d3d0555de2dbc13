//! Mutable document trees for XML parts and HTML documents.
//!
//! Both formats parse into the same arena [`Dom`], so the redaction passes
//! walk one tree shape whatever the input was.

mod arena;
mod html;
mod tree_sink;
mod xml;

pub use arena::{
    Ancestors, Attribute, ChildrenIter, Descendants, Dom, Node, NodeData, NodeId, local_name,
    qualify_like,
};
pub use html::{parse_html, write_html};
pub use tree_sink::DomSink;
pub use xml::{parse_xml, write_xml};
