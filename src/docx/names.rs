use crate::dom::{Dom, NodeId};

/// Element names of the main word-processing namespace, qualified with the
/// prefix a given part uses for it (almost always `w:`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordNames {
    prefix: String,
}

impl WordNames {
    /// Take the prefix from the part's root element (`w:document`, `w:hdr`, ...).
    pub fn for_part(dom: &Dom) -> Self {
        let prefix = dom
            .root_element()
            .and_then(|root| dom.name(root))
            .and_then(|name| name.rsplit_once(':'))
            .map(|(prefix, _)| format!("{prefix}:"))
            .unwrap_or_default();
        Self { prefix }
    }

    /// Qualified name for a local name.
    pub fn q(&self, local: &str) -> String {
        format!("{}{}", self.prefix, local)
    }

    /// Check whether `id` is the main-namespace element `local`.
    pub fn is(&self, dom: &Dom, id: NodeId, local: &str) -> bool {
        dom.name(id)
            .and_then(|name| name.strip_prefix(self.prefix.as_str()))
            .is_some_and(|rest| rest == local)
    }

    /// First child that is the main-namespace element `local`.
    pub fn child(&self, dom: &Dom, parent: NodeId, local: &str) -> Option<NodeId> {
        dom.children(parent).find(|&c| self.is(dom, c, local))
    }

    /// Nearest ancestor that is the main-namespace element `local`.
    pub fn ancestor(&self, dom: &Dom, id: NodeId, local: &str) -> Option<NodeId> {
        dom.ancestors(id).find(|&a| self.is(dom, a, local))
    }
}

impl Default for WordNames {
    fn default() -> Self {
        Self {
            prefix: "w:".to_string(),
        }
    }
}
