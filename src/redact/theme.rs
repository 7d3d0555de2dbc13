//! Theme and style-sheet neutralization.
//!
//! Runs that were normalized in the content parts can still pick up color
//! through the style hierarchy or the theme palette, so both are flattened
//! as well.

use crate::classify::{NodeClass, classify, is_theme_color_attr};
use crate::dom::{Dom, NodeId, local_name, qualify_like};
use crate::error::NodeError;

use super::counters::Counters;
use super::options::{BLACK, RedactionOptions};

/// Color scheme slots that hold page background colors.
const LIGHT_SLOTS: &[&str] = &["lt1", "lt2"];

/// Force the color scheme of a theme part to black.
///
/// Returns the number of color values changed.
pub fn neutralize_theme(dom: &mut Dom) -> Result<usize, NodeError> {
    let schemes = dom.find_local(dom.document(), "clrScheme");
    let mut colors = Vec::new();
    for scheme in schemes {
        for slot in dom.children(scheme).collect::<Vec<_>>() {
            if dom.local_name(slot).is_some_and(|l| LIGHT_SLOTS.contains(&l)) {
                continue;
            }
            colors.extend(dom.find_all(slot, |dom, id| {
                matches!(dom.local_name(id), Some("srgbClr" | "sysClr"))
            }));
        }
    }

    let mut changed = 0;
    for color in colors {
        let before = dom.attrs(color).to_vec();
        if dom.local_name(color) == Some("sysClr") {
            dom.set_attr(color, "val", "windowText")?;
            dom.set_attr(color, "lastClr", BLACK)?;
        } else {
            dom.set_attr(color, "val", BLACK)?;
        }
        if dom.attrs(color) != before.as_slice() {
            changed += 1;
        }
    }
    Ok(changed)
}

/// Strip theme links, colors and decoration from the styles part.
pub fn neutralize_styles(dom: &mut Dom, options: &RedactionOptions) -> Result<Counters, NodeError> {
    let mut counters = Counters::default();
    let root = dom.document();

    if let Some(color) = options.color_target() {
        for node in dom.find_all(root, |dom, id| dom.is_element(id)) {
            if dom.remove_attrs(node, |a| is_theme_color_attr(a.local_name()))? > 0 {
                counters.styles_reset += 1;
            }
        }

        for node in dom.find_local(root, "color") {
            let name = val_name(dom, node);
            if dom.attr(node, &name) != Some(color) {
                dom.set_attr(node, &name, color)?;
                counters.styles_reset += 1;
            }
        }
    }

    let decoration = dom.find_all(root, |dom, id| match classify(dom, id) {
        NodeClass::Shading => options.strip_shading,
        NodeClass::Border => options.strip_borders && !is_table_borders(dom, id),
        _ => false,
    });
    for node in decoration {
        // Nested decoration goes with its removed ancestor.
        if !dom.is_attached(node) {
            continue;
        }
        match classify(dom, node) {
            NodeClass::Shading => counters.shading_removed += 1,
            _ => counters.borders_removed += 1,
        }
        dom.detach(node)?;
    }

    Ok(counters)
}

/// `w:val` qualified with the element's own prefix.
fn val_name(dom: &Dom, node: NodeId) -> String {
    dom.name(node)
        .map(|name| qualify_like(name, "val"))
        .unwrap_or_else(|| "val".to_string())
}

fn is_table_borders(dom: &Dom, id: NodeId) -> bool {
    dom.local_name(id) == Some("tblBorders")
        && dom
            .parent(id)
            .and_then(|p| dom.name(p))
            .is_some_and(|name| local_name(name) == "tblPr")
}
