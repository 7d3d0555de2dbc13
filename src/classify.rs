//! Content classification by element name.
//!
//! Matching is done on the lowercased local name with substring rules, so
//! unknown namespaces and newer schema revisions still classify. A false
//! positive costs a styling element; a false negative leaks content.

use crate::dom::{Dom, NodeId};

/// Semantic class of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// Embedded picture or object (`w:drawing`, `w:pict`, `w:object`, `img`, ...).
    Image,
    /// Link wrapper (`w:hyperlink`, `a`).
    Hyperlink,
    /// Background fill (`w:shd`, `w:highlight`, `w:background`).
    Shading,
    /// Border definition (`w:pBdr`, `w:tcBorders`, `w:bdr`, ...).
    Border,
    /// Reference to a named style (`w:pStyle`, `w:rStyle`, ...).
    StyleRef,
    /// Structured content wrapper (`w:sdt`).
    ContentControl,
    Plain,
}

impl NodeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeClass::Image => "image",
            NodeClass::Hyperlink => "hyperlink",
            NodeClass::Shading => "shading",
            NodeClass::Border => "border",
            NodeClass::StyleRef => "style_ref",
            NodeClass::ContentControl => "content_control",
            NodeClass::Plain => "plain",
        }
    }
}

const IMAGE_SUBSTRINGS: &[&str] = &["drawing", "pict", "object"];
const IMAGE_HTML: &[&str] = &["img", "picture", "svg", "canvas"];
const SHADING_SUBSTRINGS: &[&str] = &["shd", "shading", "highlight", "bgcolor"];
const BORDER_SUBSTRINGS: &[&str] = &["bdr", "border"];

/// Classify an element by its local name. Checks run in a fixed order, first
/// match wins:
///
/// 1. `sdt` is a content control
/// 2. containing `hyperlink`, or exactly `a`, is a hyperlink
/// 3. containing `drawing`/`pict`/`object`, or exactly `img`/`picture`/`svg`/`canvas`, is an image
/// 4. containing `shd`/`shading`/`highlight`/`bgcolor`, or exactly `background`, is shading
/// 5. containing `bdr`/`border` is a border
/// 6. ending in `style` (and longer than it) is a style reference
pub fn classify_name(local_name: &str) -> NodeClass {
    let name = local_name.to_ascii_lowercase();

    if name == "sdt" {
        NodeClass::ContentControl
    } else if name.contains("hyperlink") || name == "a" {
        NodeClass::Hyperlink
    } else if IMAGE_SUBSTRINGS.iter().any(|s| name.contains(s))
        || IMAGE_HTML.contains(&name.as_str())
    {
        NodeClass::Image
    } else if SHADING_SUBSTRINGS.iter().any(|s| name.contains(s)) || name == "background" {
        NodeClass::Shading
    } else if BORDER_SUBSTRINGS.iter().any(|s| name.contains(s)) {
        NodeClass::Border
    } else if name.len() > "style".len() && name.ends_with("style") {
        NodeClass::StyleRef
    } else {
        NodeClass::Plain
    }
}

/// Classify a tree node. Non-elements are always [`NodeClass::Plain`].
pub fn classify(dom: &Dom, id: NodeId) -> NodeClass {
    dom.local_name(id)
        .map(classify_name)
        .unwrap_or(NodeClass::Plain)
}

/// Attribute names that link a color to the document theme
/// (`themeColor`, `themeTint`, `themeShade`, `themeFill`, ...).
pub fn is_theme_color_attr(local_name: &str) -> bool {
    local_name.len() > "theme".len()
        && local_name
            .get(.."theme".len())
            .is_some_and(|p| p.eq_ignore_ascii_case("theme"))
}
