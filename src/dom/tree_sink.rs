//! html5ever TreeSink implementation building a [`Dom`].

use std::cell::RefCell;
use std::collections::HashMap;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName};

use super::arena::{Attribute, Dom, NodeData, NodeId};

/// Handle used by TreeSink to reference nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(pub NodeId);

impl Default for NodeHandle {
    fn default() -> Self {
        NodeHandle(NodeId::NONE)
    }
}

/// TreeSink implementation that builds a [`Dom`].
///
/// Element names are stored as plain strings in the tree; the parser's
/// `QualName`s are kept on the side so [`TreeSink::elem_name`] can hand out
/// references to them.
pub struct DomSink {
    dom: RefCell<Dom>,
    names: RefCell<HashMap<NodeId, Box<QualName>>>,
    quirks_mode: RefCell<QuirksMode>,
}

impl Default for DomSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DomSink {
    pub fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
            names: RefCell::new(HashMap::new()),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    /// Consume the sink and return the tree.
    pub fn into_dom(self) -> Dom {
        let mut dom = self.dom.into_inner();
        dom.mark_clean();
        dom
    }

    fn attr_name(name: &QualName) -> String {
        match &name.prefix {
            Some(prefix) => format!("{}:{}", prefix, name.local),
            None => name.local.to_string(),
        }
    }
}

impl TreeSink for DomSink {
    type Handle = NodeHandle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: std::borrow::Cow<'static, str>) {
        // Lenient like browsers.
    }

    fn get_document(&self) -> Self::Handle {
        NodeHandle(self.dom.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let names = self.names.borrow();
        match names.get(&target.0) {
            Some(boxed) => {
                let ptr: *const QualName = boxed.as_ref();
                // SAFETY: entries are never removed from `names` while the sink
                // lives, and each QualName sits in its own Box, so the pointee
                // stays put even when the map reallocates.
                unsafe { &*ptr }
            }
            None => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let converted: Vec<Attribute> = attrs
            .into_iter()
            .map(|a| Attribute::new(Self::attr_name(&a.name), a.value.to_string()))
            .collect();

        let id = self
            .dom
            .borrow_mut()
            .create_element(name.local.to_string(), converted);
        self.names.borrow_mut().insert(id, Box::new(name));
        NodeHandle(id)
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        let id = self.dom.borrow_mut().create_raw(format!("<!--{text}-->"));
        NodeHandle(id)
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        let id = self.dom.borrow_mut().create_raw(format!("<?{target} {data}>"));
        NodeHandle(id)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(parent.0, node.0),
            NodeOrText::AppendText(text) => dom.append_text(parent.0, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self.dom.borrow().parent(element.0);
        match parent {
            Some(_) => self.append_before_sibling(element, child),
            None => self.append(prev_element, child),
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let markup = if public_id.is_empty() && system_id.is_empty() {
            format!("<!DOCTYPE {name}>")
        } else if system_id.is_empty() {
            format!("<!DOCTYPE {name} PUBLIC \"{public_id}\">")
        } else {
            format!("<!DOCTYPE {name} PUBLIC \"{public_id}\" \"{system_id}\">")
        };
        let mut dom = self.dom.borrow_mut();
        let doc = dom.document();
        let doctype = dom.create_raw(markup);
        dom.append(doc, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents stay inline under the template element.
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.0 == y.0
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => dom.insert_before(sibling.0, node.0),
            NodeOrText::AppendText(text) => {
                let text_node = dom.create_text(text.to_string());
                dom.insert_before(sibling.0, text_node);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        let mut dom = self.dom.borrow_mut();
        if let Some(node) = dom.get_mut(target.0)
            && let NodeData::Element {
                attrs: existing, ..
            } = &mut node.data
        {
            for attr in attrs {
                let name = Self::attr_name(&attr.name);
                if !existing.iter().any(|a| a.name == name) {
                    existing.push(Attribute::new(name, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        // Already-detached nodes are fine here.
        let _ = self.dom.borrow_mut().detach(target.0);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut dom = self.dom.borrow_mut();
        let children: Vec<_> = dom.children(node.0).collect();
        for child in children {
            let _ = dom.detach(child);
            dom.append(new_parent.0, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::html::parse_html;

    #[test]
    fn test_basic_parse() {
        let dom = parse_html("<html><body><p>Hello</p></body></html>");

        let p = dom.find_local(dom.document(), "p")[0];
        assert_eq!(dom.name(p), Some("p"));
        assert_eq!(dom.text_content(p), "Hello");
        assert!(!dom.is_modified());
    }

    #[test]
    fn test_attributes() {
        let dom = parse_html(r#"<div id="main" class="container header">Content</div>"#);
        let div = dom.find_local(dom.document(), "div")[0];
        assert_eq!(dom.attr(div, "id"), Some("main"));
        assert_eq!(dom.attr(div, "class"), Some("container header"));
    }

    #[test]
    fn test_misnested_markup_is_repaired() {
        let dom = parse_html("<p><b>bold <i>both</b> italic</i></p>");
        let p = dom.find_local(dom.document(), "p")[0];
        assert_eq!(dom.text_content(p), "bold both italic");
    }
}
