//! Arena-based document tree.
//!
//! Every node lives in one contiguous vector; parent/child/sibling links are
//! indices into it. Removing a node only unlinks it, so ids collected before
//! a mutation pass stay valid for the whole pass.

use crate::error::NodeError;

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with its qualified name (`w:p`, `a`) and ordered attributes.
    Element { name: String, attrs: Vec<Attribute> },
    /// Character data, unescaped.
    Text(String),
    /// Markup written back verbatim (declarations, comments, PIs, doctypes).
    Raw(String),
}

/// A qualified attribute name and its unescaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Attribute name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix of the attribute name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.rsplit_once(':').map(|(p, _)| p)
    }
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Strip the namespace prefix from a qualified name.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

/// Qualify `local` with the prefix of `like` (`"w:rPr"`, `"color"` -> `"w:color"`).
pub fn qualify_like(like: &str, local: &str) -> String {
    match like.rsplit_once(':') {
        Some((prefix, _)) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

/// Arena-based document tree.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
    modified: bool,
}

impl Dom {
    /// Create a new empty tree with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
            modified: false,
        };
        dom.document = dom.alloc(Node::new(NodeData::Document));
        dom
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// First element child of the document.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.document).find(|&c| self.is_element(c))
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Check whether any mutation happened since the tree was built.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn mark_clean(&mut self) {
        self.modified = false;
    }

    /// Get the number of allocated nodes (attached or not).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree only has its document root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    // --- Construction ---

    /// Create a new, unattached element node.
    pub fn create_element(&mut self, name: impl Into<String>, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(Node::new(NodeData::Element {
            name: name.into(),
            attrs,
        }))
    }

    /// Create a new, unattached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text.into())))
    }

    /// Create a new, unattached verbatim markup node.
    pub fn create_raw(&mut self, markup: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Raw(markup.into())))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
        self.modified = true;
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
        self.modified = true;
    }

    /// Insert `new_node` as the first child of `parent`.
    pub fn prepend(&mut self, parent: NodeId, new_node: NodeId) {
        match self.get(parent).map(|n| n.first_child) {
            Some(first) if first.is_some() => self.insert_before(first, new_node),
            _ => self.append(parent, new_node),
        }
    }

    /// Append text to an existing text node, or create new if last child isn't text.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            self.modified = true;
            return;
        }

        let text_node = self.create_text(text);
        self.append(parent, text_node);
    }

    // --- Removal ---

    /// Unlink a node from its parent. Its subtree stays intact.
    pub fn detach(&mut self, id: NodeId) -> Result<(), NodeError> {
        let (parent, prev, next) = match self.get(id) {
            Some(n) if n.parent.is_some() => (n.parent, n.prev_sibling, n.next_sibling),
            Some(_) => return Err(NodeError::Detached(id.0)),
            None => return Err(NodeError::Missing(id.0)),
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
        self.modified = true;
        Ok(())
    }

    /// Move every child of `from` in front of `anchor`, keeping their order.
    pub fn move_children_before(&mut self, from: NodeId, anchor: NodeId) -> Result<usize, NodeError> {
        if self.get(anchor).is_none_or(|n| n.parent.is_none()) {
            return Err(NodeError::Detached(anchor.0));
        }
        let children: Vec<_> = self.children(from).collect();
        for &child in &children {
            self.detach(child)?;
            self.insert_before(anchor, child);
        }
        Ok(children.len())
    }

    /// Replace a node by its children at the same position.
    ///
    /// Returns the ids of the children that were moved, in order.
    pub fn unwrap(&mut self, id: NodeId) -> Result<Vec<NodeId>, NodeError> {
        let children: Vec<_> = self.children(id).collect();
        self.move_children_before(id, id)?;
        self.detach(id)?;
        Ok(children)
    }

    // --- Navigation ---

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// Iterate over all descendants of a node in document order (pre-order).
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let mut stack: Vec<_> = self.children(root).collect();
        stack.reverse();
        Descendants { dom: self, stack }
    }

    /// Iterate over the ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            current: self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE),
        }
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_some())
    }

    /// Check whether the node is still reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.document || self.ancestors(id).any(|a| a == self.document)
    }

    /// Collect every descendant of `root` matching `predicate`, in document order.
    pub fn find_all<F>(&self, root: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Dom, NodeId) -> bool,
    {
        self.descendants(root)
            .filter(|&id| predicate(self, id))
            .collect()
    }

    /// Collect every descendant element of `root` with the given local name.
    pub fn find_local(&self, root: NodeId, local: &str) -> Vec<NodeId> {
        self.find_all(root, |dom, id| dom.local_name(id) == Some(local))
    }

    // --- Element accessors ---

    /// Check if node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Check if node is a text node.
    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Qualified element name.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Element name without its namespace prefix.
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id).map(local_name)
    }

    /// Attributes of an element (empty for other nodes).
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Get an attribute value by qualified name.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set (or add) an attribute by qualified name.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        let attrs = self.attrs_mut(id)?;
        match attrs.iter_mut().find(|a| a.name == name) {
            Some(existing) if existing.value == value => return Ok(()),
            Some(existing) => existing.value = value.to_string(),
            None => attrs.push(Attribute::new(name, value)),
        }
        self.modified = true;
        Ok(())
    }

    /// Remove every attribute for which `predicate` holds. Returns the count removed.
    pub fn remove_attrs<F>(&mut self, id: NodeId, predicate: F) -> Result<usize, NodeError>
    where
        F: Fn(&Attribute) -> bool,
    {
        let attrs = self.attrs_mut(id)?;
        let before = attrs.len();
        attrs.retain(|a| !predicate(a));
        let removed = before - attrs.len();
        if removed > 0 {
            self.modified = true;
        }
        Ok(removed)
    }

    fn attrs_mut(&mut self, id: NodeId) -> Result<&mut Vec<Attribute>, NodeError> {
        match self.get_mut(id) {
            Some(Node {
                data: NodeData::Element { attrs, .. },
                ..
            }) => Ok(attrs),
            Some(_) => Err(NodeError::NotElement(id.0)),
            None => Err(NodeError::Missing(id.0)),
        }
    }

    // --- Text accessors ---

    /// Get text content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Replace the content of a text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), NodeError> {
        match self.get_mut(id) {
            Some(Node {
                data: NodeData::Text(existing),
                ..
            }) => {
                if existing != text {
                    *existing = text.to_string();
                    self.modified = true;
                }
                Ok(())
            }
            Some(_) => Err(NodeError::Malformed(format!("node {} is not text", id.0))),
            None => Err(NodeError::Missing(id.0)),
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for d in self.descendants(id) {
            if let Some(t) = self.text(d) {
                out.push_str(t);
            }
        }
        out
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a Dom,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over a subtree (root excluded).
pub struct Descendants<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let mut children: Vec<_> = self.dom.children(id).collect();
        children.reverse();
        self.stack.extend(children);
        Some(id)
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<'a> {
    dom: &'a Dom,
    current: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.parent)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}
