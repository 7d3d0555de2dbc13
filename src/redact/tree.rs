//! Structural redaction of one word-processing part.
//!
//! Every pass gathers its targets first and mutates afterwards, so node ids
//! never go stale under an iterator. Each node operation is fallible on its
//! own; a failure is logged, recorded as a [`NodeWarning`] and the pass moves
//! on to the next node.

use crate::classify::{NodeClass, classify, is_theme_color_attr};
use crate::docx::WordNames;
use crate::dom::{Dom, NodeId};
use crate::error::{NodeError, NodeWarning};
use crate::images::{ImageFilter, is_outermost_embedding};
use crate::rules::RuleSet;

use super::counters::Counters;
use super::options::{RedactionOptions, Strategy};

/// Child order of run properties (`CT_RPr`).
pub(crate) const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath", "rPrChange",
];

/// Child order of paragraph properties (`CT_PPr`).
pub(crate) const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle", "rPr",
    "sectPr", "pPrChange",
];

/// Paragraph style every paragraph is reset to.
pub const NORMAL_STYLE: &str = "Normal";

/// Font slots of `w:rFonts`.
const FONT_SLOTS: &[&str] = &["ascii", "hAnsi", "eastAsia", "cs"];

/// Markup-compatibility wrappers left behind when their embedding goes.
const ALTERNATE_CONTENT: &[&str] = &["AlternateContent", "Choice", "Fallback"];

/// Outcome of redacting one part.
#[derive(Debug, Clone, Default)]
pub struct PartReport {
    pub counters: Counters,
    pub warnings: Vec<NodeWarning>,
    /// Relationship ids of unwrapped hyperlinks.
    pub unlinked: Vec<String>,
}

/// Redacts one parsed content part in place.
pub struct PartRedactor<'a> {
    dom: &'a mut Dom,
    part: &'a str,
    names: WordNames,
    rules: &'a RuleSet,
    options: &'a RedactionOptions,
    images: &'a ImageFilter,
    report: PartReport,
}

impl<'a> PartRedactor<'a> {
    pub fn new(
        dom: &'a mut Dom,
        part: &'a str,
        rules: &'a RuleSet,
        options: &'a RedactionOptions,
        images: &'a ImageFilter,
    ) -> Self {
        let names = WordNames::for_part(dom);
        Self {
            dom,
            part,
            names,
            rules,
            options,
            images,
            report: PartReport::default(),
        }
    }

    /// Run every pass and return what changed.
    pub fn run(mut self) -> PartReport {
        let Some(root) = self.dom.root_element() else {
            self.warn("parse", NodeError::Malformed("part has no root element".into()));
            return self.report;
        };

        if self.options.strip_content_controls {
            self.unwrap_content_controls(root);
        }

        match self.options.strategy {
            Strategy::Structural => {
                let container = self.names.child(self.dom, root, "body").unwrap_or(root);
                let blocks: Vec<_> = self
                    .dom
                    .children(container)
                    .filter(|&c| self.dom.is_element(c))
                    .collect();
                for block in blocks {
                    self.run_passes(block);
                }
            }
            Strategy::Tree => self.run_passes(root),
        }

        if self.options.strip_shading {
            self.remove_page_background(root);
        }

        tracing::debug!(part = self.part, counters = ?self.report.counters, "redacted part");
        self.report
    }

    fn run_passes(&mut self, scope: NodeId) {
        self.normalize_runs(scope);
        self.strip_decoration(scope);
        self.unwrap_hyperlinks(scope);
        self.remove_images(scope);
        self.reset_paragraphs(scope);
        self.substitute_text(scope);
    }

    fn warn(&mut self, step: &'static str, error: NodeError) {
        tracing::warn!(part = self.part, step, error = %error, "skipped node");
        self.report
            .warnings
            .push(NodeWarning::new(self.part, step, error.to_string()));
    }

    fn guard<T>(&mut self, step: &'static str, result: Result<T, NodeError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.warn(step, e);
                None
            }
        }
    }

    /// `scope` itself (when it matches) followed by its matching descendants.
    fn in_scope<F>(&self, scope: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Dom, NodeId) -> bool,
    {
        let mut found = Vec::new();
        if predicate(self.dom, scope) {
            found.push(scope);
        }
        found.extend(self.dom.find_all(scope, &predicate));
        found
    }

    fn word_elements(&self, scope: NodeId, local: &str) -> Vec<NodeId> {
        let names = &self.names;
        self.in_scope(scope, |dom, id| names.is(dom, id, local))
    }

    // --- Content controls ---

    fn unwrap_content_controls(&mut self, root: NodeId) {
        let controls = self
            .dom
            .find_all(root, |dom, id| classify(dom, id) == NodeClass::ContentControl);
        for sdt in controls {
            let result = self.unwrap_content_control(sdt);
            if self.guard("content_controls", result).is_some() {
                self.report.counters.content_controls_unwrapped += 1;
            }
        }
    }

    fn unwrap_content_control(&mut self, sdt: NodeId) -> Result<(), NodeError> {
        let content = self
            .dom
            .children(sdt)
            .find(|&c| self.dom.local_name(c) == Some("sdtContent"));
        if let Some(content) = content {
            self.dom.move_children_before(content, sdt)?;
        }
        // Drops the properties (sdtPr, sdtEndPr) with the wrapper.
        self.dom.detach(sdt)
    }

    // --- Run properties ---

    fn normalize_runs(&mut self, scope: NodeId) {
        if !self.options.normalizes_runs() {
            return;
        }

        for run in self.word_elements(scope, "r") {
            if self.names.child(self.dom, run, "rPr").is_none() {
                let rpr = self.dom.create_element(self.names.q("rPr"), Vec::new());
                self.dom.prepend(run, rpr);
            }
        }

        for rpr in self.word_elements(scope, "rPr") {
            let result = self.normalize_rpr(rpr);
            if let Some(true) = self.guard("normalize_runs", result) {
                self.report.counters.styles_reset += 1;
            }
        }
    }

    fn normalize_rpr(&mut self, rpr: NodeId) -> Result<bool, NodeError> {
        let options = self.options;
        let mut changed = false;

        if let Some(color) = options.color_target() {
            let node = self.ensure_property(rpr, "color", RPR_ORDER)?;
            changed |= self.set_word_attr(node, "val", color)?;
            changed |= self
                .dom
                .remove_attrs(node, |a| is_theme_color_attr(a.local_name()))?
                > 0;
        }

        if let Some((font, half_points)) = options.font_target() {
            let fonts = self.ensure_property(rpr, "rFonts", RPR_ORDER)?;
            for slot in FONT_SLOTS {
                changed |= self.set_word_attr(fonts, slot, font)?;
            }
            // Theme font links (asciiTheme, cstheme, ...) override explicit fonts.
            changed |= self
                .dom
                .remove_attrs(fonts, |a| a.local_name().to_ascii_lowercase().ends_with("theme"))?
                > 0;

            let size = half_points.to_string();
            for local in ["sz", "szCs"] {
                let node = self.ensure_property(rpr, local, RPR_ORDER)?;
                changed |= self.set_word_attr(node, "val", &size)?;
            }
        }

        Ok(changed)
    }

    /// Find the property child `local`, creating it at its schema position.
    fn ensure_property(
        &mut self,
        parent: NodeId,
        local: &str,
        order: &[&str],
    ) -> Result<NodeId, NodeError> {
        if !self.dom.is_element(parent) {
            return Err(NodeError::NotElement(parent.0));
        }
        if let Some(existing) = self.names.child(self.dom, parent, local) {
            return Ok(existing);
        }

        let node = self.dom.create_element(self.names.q(local), Vec::new());
        let rank = order.iter().position(|&n| n == local);
        let before = rank.and_then(|rank| {
            self.dom.children(parent).find(|&c| {
                self.dom
                    .local_name(c)
                    .and_then(|l| order.iter().position(|&n| n == l))
                    .is_some_and(|r| r > rank)
            })
        });
        match before {
            Some(sibling) => self.dom.insert_before(sibling, node),
            None => self.dom.append(parent, node),
        }
        Ok(node)
    }

    fn set_word_attr(&mut self, node: NodeId, local: &str, value: &str) -> Result<bool, NodeError> {
        let name = self.names.q(local);
        if self.dom.attr(node, &name) == Some(value) {
            return Ok(false);
        }
        self.dom.set_attr(node, &name, value)?;
        Ok(true)
    }

    // --- Shading and borders ---

    fn strip_decoration(&mut self, scope: NodeId) {
        let shading = self.options.strip_shading;
        let borders = self.options.strip_borders;
        if !shading && !borders {
            return;
        }

        let targets = self.in_scope(scope, |dom, id| match classify(dom, id) {
            NodeClass::Shading => shading,
            NodeClass::Border => borders && !is_table_grid(dom, id),
            _ => false,
        });
        for node in targets {
            let class = classify(self.dom, node);
            let result = self.dom.detach(node);
            if self.guard("strip_decoration", result).is_some() {
                match class {
                    NodeClass::Shading => self.report.counters.shading_removed += 1,
                    _ => self.report.counters.borders_removed += 1,
                }
            }
        }
    }

    fn remove_page_background(&mut self, root: NodeId) {
        let Some(background) = self.names.child(self.dom, root, "background") else {
            return;
        };
        let result = self.dom.detach(background);
        if self.guard("strip_decoration", result).is_some() {
            self.report.counters.shading_removed += 1;
        }
    }

    // --- Hyperlinks ---

    fn unwrap_hyperlinks(&mut self, scope: NodeId) {
        if !self.options.strip_hyperlinks {
            return;
        }

        let links = self.in_scope(scope, |dom, id| classify(dom, id) == NodeClass::Hyperlink);
        for link in links {
            let rel_id = self
                .dom
                .attrs(link)
                .iter()
                .find(|a| a.prefix().is_some() && a.local_name() == "id")
                .map(|a| a.value.clone());
            let result = self.unwrap_hyperlink(link);
            if self.guard("unwrap_hyperlinks", result).is_some() {
                self.report.counters.hyperlinks_removed += 1;
                self.report.unlinked.extend(rel_id);
            }
        }
    }

    fn unwrap_hyperlink(&mut self, link: NodeId) -> Result<(), NodeError> {
        let moved = self.dom.unwrap(link)?;
        for node in moved {
            for run in self.word_elements(node, "r") {
                self.clear_link_styling(run)?;
            }
        }
        Ok(())
    }

    fn clear_link_styling(&mut self, run: NodeId) -> Result<(), NodeError> {
        let Some(rpr) = self.names.child(self.dom, run, "rPr") else {
            return Ok(());
        };
        let decoration: Vec<_> = self
            .dom
            .children(rpr)
            .filter(|&c| {
                matches!(self.dom.local_name(c), Some("u" | "color"))
                    || classify(self.dom, c) == NodeClass::StyleRef
            })
            .collect();
        for node in decoration {
            self.dom.detach(node)?;
        }
        if self.options.normalizes_runs() {
            self.normalize_rpr(rpr)?;
        }
        Ok(())
    }

    // --- Images ---

    fn remove_images(&mut self, scope: NodeId) {
        if !self.options.strip_images || self.images.is_keep() {
            return;
        }

        let filter = self.images;
        let targets = self.in_scope(scope, |dom, id| {
            is_outermost_embedding(dom, id) && filter.matches(dom, id)
        });
        for node in targets {
            let in_fallback = self
                .dom
                .parent(node)
                .and_then(|p| self.dom.local_name(p))
                == Some("Fallback");
            let result = self.remove_embedding(node);
            if self.guard("remove_images", result).is_some() && !in_fallback {
                self.report.counters.images_removed += 1;
            }
        }
    }

    fn remove_embedding(&mut self, node: NodeId) -> Result<(), NodeError> {
        let mut parent = self.dom.parent(node);
        self.dom.detach(node)?;

        // Empty mc:Choice / mc:Fallback / mc:AlternateContent shells go too.
        while let Some(p) = parent {
            let is_shell = self
                .dom
                .local_name(p)
                .is_some_and(|l| ALTERNATE_CONTENT.contains(&l));
            if !is_shell || self.dom.children(p).any(|c| self.dom.is_element(c)) {
                break;
            }
            parent = self.dom.parent(p);
            self.dom.detach(p)?;
        }

        // A run left with nothing but its properties goes as well.
        if let Some(run) = parent.filter(|&p| self.names.is(self.dom, p, "r")) {
            let only_properties = self
                .dom
                .children(run)
                .all(|c| self.names.is(self.dom, c, "rPr"));
            if only_properties {
                self.dom.detach(run)?;
            }
        }
        Ok(())
    }

    // --- Paragraph styles ---

    fn reset_paragraphs(&mut self, scope: NodeId) {
        if !self.options.reset_paragraph_styles {
            return;
        }
        for paragraph in self.word_elements(scope, "p") {
            let result = self.reset_paragraph(paragraph);
            if let Some(true) = self.guard("reset_paragraphs", result) {
                self.report.counters.styles_reset += 1;
            }
        }
    }

    fn reset_paragraph(&mut self, paragraph: NodeId) -> Result<bool, NodeError> {
        let Some(ppr) = self.names.child(self.dom, paragraph, "pPr") else {
            return Ok(false);
        };
        let mut changed = false;
        for local in ["numPr", "ind"] {
            if let Some(node) = self.names.child(self.dom, ppr, local) {
                self.dom.detach(node)?;
                changed = true;
            }
        }
        if let Some(style) = self.names.child(self.dom, ppr, "pStyle") {
            changed |= self.set_word_attr(style, "val", NORMAL_STYLE)?;
        }
        Ok(changed)
    }

    // --- Text ---

    fn substitute_text(&mut self, scope: NodeId) {
        if self.rules.is_empty() {
            return;
        }
        for paragraph in self.word_elements(scope, "p") {
            for leaf_kind in ["t", "delText"] {
                let leaves = self.text_leaves(paragraph, leaf_kind);
                if leaves.is_empty() {
                    continue;
                }
                let before: Vec<String> = leaves.iter().map(|&t| self.dom.text_content(t)).collect();
                let mut after = before.clone();
                let count = self.rules.apply_segments(&mut after);
                if count == 0 {
                    continue;
                }
                self.report.counters.text_replacements += count;
                for ((&leaf, old), new) in leaves.iter().zip(&before).zip(&after) {
                    if old != new {
                        let result = self.set_leaf_text(leaf, new);
                        self.guard("substitute_text", result);
                    }
                }
            }
        }
    }

    /// Text leaves owned by `paragraph` (not by a paragraph nested in a text box).
    fn text_leaves(&self, paragraph: NodeId, local: &str) -> Vec<NodeId> {
        let names = &self.names;
        self.dom.find_all(paragraph, |dom, id| {
            names.is(dom, id, local) && names.ancestor(dom, id, "p") == Some(paragraph)
        })
    }

    fn set_leaf_text(&mut self, leaf: NodeId, text: &str) -> Result<(), NodeError> {
        let old: Vec<_> = self.dom.children(leaf).collect();
        for child in old {
            self.dom.detach(child)?;
        }
        if !text.is_empty() {
            let node = self.dom.create_text(text);
            self.dom.append(leaf, node);
        }
        if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
            self.dom.set_attr(leaf, "xml:space", "preserve")?;
        }
        Ok(())
    }
}

/// Table-level borders (`tblPr/tblBorders`) draw the grid and are kept.
fn is_table_grid(dom: &Dom, id: NodeId) -> bool {
    dom.local_name(id) == Some("tblBorders")
        && dom
            .parent(id)
            .and_then(|p| dom.local_name(p))
            .is_some_and(|l| l == "tblPr")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_xml, write_xml};
    use crate::rules::ReplacementRule;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

    fn doc(body: &str) -> Dom {
        parse_xml(&format!("<w:document {NS}><w:body>{body}</w:body></w:document>")).unwrap()
    }

    fn run(dom: &mut Dom, options: &RedactionOptions, rules: &[(&str, &str)]) -> PartReport {
        let rules: Vec<_> = rules
            .iter()
            .map(|(p, r)| ReplacementRule::new(*p, *r))
            .collect();
        let rules = RuleSet::new(&rules).unwrap();
        PartRedactor::new(dom, "word/document.xml", &rules, options, &ImageFilter::All).run()
    }

    fn body_xml(dom: &Dom) -> String {
        let xml = write_xml(dom);
        let start = xml.find("<w:body>").unwrap() + "<w:body>".len();
        let end = xml.find("</w:body>").unwrap();
        xml[start..end].to_string()
    }

    #[test]
    fn test_content_control_unwrapped_in_place() {
        let mut dom = doc(
            "<w:p><w:r><w:t>a</w:t></w:r></w:p>\
             <w:sdt><w:sdtPr><w:shd w:fill=\"FF0000\"/></w:sdtPr><w:sdtContent>\
             <w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl><w:p/></w:sdtContent></w:sdt>\
             <w:p><w:r><w:t>c</w:t></w:r></w:p>",
        );
        let options = RedactionOptions {
            strip_content_controls: true,
            ..RedactionOptions::text_only()
        };
        let report = run(&mut dom, &options, &[]);
        assert_eq!(report.counters.content_controls_unwrapped, 1);
        assert_eq!(
            body_xml(&dom),
            "<w:p><w:r><w:t>a</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl><w:p/>\
             <w:p><w:r><w:t>c</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_run_properties_normalized_in_schema_order() {
        let mut dom = doc(
            "<w:p><w:r><w:rPr><w:b/><w:color w:val=\"FF0000\" w:themeColor=\"accent1\"/>\
             <w:u w:val=\"single\"/></w:rPr><w:t>x</w:t></w:r><w:r><w:t>y</w:t></w:r></w:p>",
        );
        let report = run(&mut dom, &RedactionOptions::default(), &[]);
        assert_eq!(report.counters.styles_reset, 2);
        assert_eq!(
            body_xml(&dom),
            "<w:p><w:r><w:rPr><w:rFonts w:ascii=\"Calibri\" w:hAnsi=\"Calibri\" \
             w:eastAsia=\"Calibri\" w:cs=\"Calibri\"/><w:b/><w:color w:val=\"000000\"/>\
             <w:sz w:val=\"22\"/><w:szCs w:val=\"22\"/><w:u w:val=\"single\"/></w:rPr>\
             <w:t>x</w:t></w:r><w:r><w:rPr><w:rFonts w:ascii=\"Calibri\" w:hAnsi=\"Calibri\" \
             w:eastAsia=\"Calibri\" w:cs=\"Calibri\"/><w:color w:val=\"000000\"/>\
             <w:sz w:val=\"22\"/><w:szCs w:val=\"22\"/></w:rPr><w:t>y</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_shading_and_borders_removed_structure_kept() {
        let mut dom = doc(
            "<w:tbl><w:tblPr><w:tblBorders><w:top w:val=\"single\"/></w:tblBorders></w:tblPr>\
             <w:tr><w:tc><w:tcPr><w:shd w:fill=\"D9D9D9\"/><w:tcBorders/></w:tcPr>\
             <w:p><w:pPr><w:pBdr/></w:pPr><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        let options = RedactionOptions {
            strip_shading: true,
            strip_borders: true,
            ..RedactionOptions::text_only()
        };
        let report = run(&mut dom, &options, &[]);
        assert_eq!(report.counters.shading_removed, 1);
        assert_eq!(report.counters.borders_removed, 2);
        assert_eq!(
            body_xml(&dom),
            "<w:tbl><w:tblPr><w:tblBorders><w:top w:val=\"single\"/></w:tblBorders></w:tblPr>\
             <w:tr><w:tc><w:tcPr/><w:p><w:pPr/><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"
        );
    }

    #[test]
    fn test_hyperlink_unwrapped_text_identical() {
        let mut dom = doc(
            "<w:p><w:r><w:t xml:space=\"preserve\">See </w:t></w:r>\
             <w:hyperlink r:id=\"rId7\"><w:r><w:rPr><w:rStyle w:val=\"Hyperlink\"/>\
             <w:color w:val=\"0563C1\"/><w:u w:val=\"single\"/></w:rPr><w:t>Click here</w:t></w:r>\
             </w:hyperlink></w:p>",
        );
        let options = RedactionOptions {
            standardize_fonts: false,
            ..RedactionOptions::default()
        };
        let report = run(&mut dom, &options, &[]);
        assert_eq!(report.counters.hyperlinks_removed, 1);
        assert_eq!(report.unlinked, vec!["rId7".to_string()]);
        let xml = body_xml(&dom);
        assert!(!xml.contains("hyperlink"));
        assert!(!xml.contains("<w:u "));
        assert!(!xml.contains("rStyle"));
        assert!(xml.contains("<w:r><w:rPr><w:color w:val=\"000000\"/></w:rPr><w:t>Click here</w:t></w:r>"));
        let p = dom.find_local(dom.document(), "p")[0];
        assert_eq!(dom.text_content(p), "See Click here");
    }

    #[test]
    fn test_images_removed_with_empty_runs() {
        let mut dom = doc(
            "<w:p><w:r><w:drawing><a:blip r:embed=\"rId1\"/></w:drawing></w:r>\
             <w:r><w:t>keep</w:t><w:pict><v:imagedata r:id=\"rId2\"/></w:pict></w:r></w:p>",
        );
        let options = RedactionOptions {
            strip_images: true,
            ..RedactionOptions::text_only()
        };
        let report = run(&mut dom, &options, &[]);
        assert_eq!(report.counters.images_removed, 2);
        assert_eq!(body_xml(&dom), "<w:p><w:r><w:t>keep</w:t></w:r></w:p>");
    }

    #[test]
    fn test_alternate_content_removed_once() {
        let mut dom = doc(
            "<w:p><w:r><mc:AlternateContent><mc:Choice Requires=\"wps\"><w:drawing/></mc:Choice>\
             <mc:Fallback><w:pict/></mc:Fallback></mc:AlternateContent></w:r><w:r><w:t>t</w:t></w:r></w:p>",
        );
        let options = RedactionOptions {
            strip_images: true,
            ..RedactionOptions::text_only()
        };
        let report = run(&mut dom, &options, &[]);
        assert_eq!(report.counters.images_removed, 1);
        assert_eq!(body_xml(&dom), "<w:p><w:r><w:t>t</w:t></w:r></w:p>");
    }

    #[test]
    fn test_numbering_and_style_reset() {
        let mut dom = doc(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/><w:numPr><w:numId w:val=\"3\"/></w:numPr>\
             <w:ind w:left=\"720\"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>",
        );
        let options = RedactionOptions {
            reset_paragraph_styles: true,
            ..RedactionOptions::text_only()
        };
        let report = run(&mut dom, &options, &[]);
        assert_eq!(report.counters.styles_reset, 1);
        assert_eq!(
            body_xml(&dom),
            "<w:p><w:pPr><w:pStyle w:val=\"Normal\"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_text_substitution_across_runs() {
        let mut dom = doc(
            "<w:p><w:r><w:t>Project status: confi</w:t></w:r><w:r><w:rPr><w:b/></w:rPr>\
             <w:t>dential</w:t></w:r></w:p><w:p><w:r><w:t>Contact: alice@example.com</w:t></w:r></w:p>",
        );
        let report = run(
            &mut dom,
            &RedactionOptions::text_only(),
            &[
                ("confidential", "[REDACTED]"),
                (r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b", "[EMAIL]"),
            ],
        );
        assert_eq!(report.counters.text_replacements, 2);
        let paragraphs = dom.find_local(dom.document(), "p");
        assert_eq!(dom.text_content(paragraphs[0]), "Project status: [REDACTED]");
        assert_eq!(dom.text_content(paragraphs[1]), "Contact: [EMAIL]");
    }

    #[test]
    fn test_strategies_agree() {
        let body = "<w:sdt><w:sdtContent><w:p><w:pPr><w:shd w:fill=\"FF0000\"/></w:pPr>\
                    <w:hyperlink r:id=\"rId1\"><w:r><w:t>secret link</w:t></w:r></w:hyperlink>\
                    </w:p></w:sdtContent></w:sdt><w:p><w:r><w:drawing/></w:r></w:p>";
        let mut structural = doc(body);
        let mut tree = doc(body);
        let a = run(&mut structural, &RedactionOptions::default(), &[("secret", "[R]")]);
        let b = run(
            &mut tree,
            &RedactionOptions {
                strategy: Strategy::Tree,
                ..RedactionOptions::default()
            },
            &[("secret", "[R]")],
        );
        assert_eq!(a.counters, b.counters);
        assert_eq!(write_xml(&structural), write_xml(&tree));
    }

    #[test]
    fn test_node_fault_is_recorded_and_skipped() {
        let mut dom = doc("<w:p><w:hyperlink><w:r><w:t>x</w:t></w:r></w:hyperlink></w:p>");
        let link = dom.find_local(dom.document(), "hyperlink")[0];
        dom.detach(link).unwrap();

        let rules = RuleSet::default();
        let options = RedactionOptions::default();
        let filter = ImageFilter::All;
        let mut redactor = PartRedactor::new(&mut dom, "word/document.xml", &rules, &options, &filter);
        let result = redactor.unwrap_hyperlink(link);
        assert!(redactor.guard("unwrap_hyperlinks", result).is_none());
        assert_eq!(redactor.report.warnings.len(), 1);
        assert_eq!(redactor.report.warnings[0].step, "unwrap_hyperlinks");
    }
}
